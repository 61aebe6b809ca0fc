//! Types de données pour le crate zonage

use std::fmt;
use std::str::FromStr;

use geo::{Geometry, MultiPolygon, Point, Polygon};

/// Code EPSG du WGS84, seul système accepté par les jointures
pub const WGS84_EPSG: u32 = 4326;

/// Niveau de zone, ordonné par priorité (Zone 1 = la plus prioritaire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ZoneLevel {
    Zone1,
    Zone2,
    Zone3,
}

impl ZoneLevel {
    /// Tous les niveaux, du plus prioritaire au moins prioritaire
    pub const ALL: [ZoneLevel; 3] = [ZoneLevel::Zone1, ZoneLevel::Zone2, ZoneLevel::Zone3];

    /// Rang 1, 2 ou 3
    pub fn rank(self) -> u8 {
        match self {
            ZoneLevel::Zone1 => 1,
            ZoneLevel::Zone2 => 2,
            ZoneLevel::Zone3 => 3,
        }
    }

    pub fn from_rank(rank: u8) -> Option<Self> {
        match rank {
            1 => Some(ZoneLevel::Zone1),
            2 => Some(ZoneLevel::Zone2),
            3 => Some(ZoneLevel::Zone3),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ZoneLevel::Zone1 => "Zone 1",
            ZoneLevel::Zone2 => "Zone 2",
            ZoneLevel::Zone3 => "Zone 3",
        }
    }

    /// Tolérance de simplification par défaut (degrés)
    ///
    /// Plus la zone est large, plus la tolérance est grossière.
    pub fn default_tolerance(self) -> f64 {
        match self {
            ZoneLevel::Zone1 => 0.001,
            ZoneLevel::Zone2 => 0.01,
            ZoneLevel::Zone3 => 0.05,
        }
    }
}

impl fmt::Display for ZoneLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Affectation d'une commune
///
/// `Unclassified` est une issue nommée, pas une valeur par défaut implicite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ZoneAssignment {
    Zone1,
    Zone2,
    Zone3,
    Unclassified,
}

impl ZoneAssignment {
    /// Toutes les affectations possibles, dans l'ordre d'affichage
    pub const ALL: [ZoneAssignment; 4] = [
        ZoneAssignment::Zone1,
        ZoneAssignment::Zone2,
        ZoneAssignment::Zone3,
        ZoneAssignment::Unclassified,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ZoneAssignment::Zone1 => "Zone 1",
            ZoneAssignment::Zone2 => "Zone 2",
            ZoneAssignment::Zone3 => "Zone 3",
            ZoneAssignment::Unclassified => "Hors zone",
        }
    }

    /// Couleur utilisée par la carte (contours et marqueurs)
    pub fn color(self) -> &'static str {
        match self {
            ZoneAssignment::Zone1 => "green",
            ZoneAssignment::Zone2 => "yellow",
            ZoneAssignment::Zone3 => "blue",
            ZoneAssignment::Unclassified => "gray",
        }
    }

    pub fn level(self) -> Option<ZoneLevel> {
        match self {
            ZoneAssignment::Zone1 => Some(ZoneLevel::Zone1),
            ZoneAssignment::Zone2 => Some(ZoneLevel::Zone2),
            ZoneAssignment::Zone3 => Some(ZoneLevel::Zone3),
            ZoneAssignment::Unclassified => None,
        }
    }

    pub fn is_classified(self) -> bool {
        self.level().is_some()
    }
}

impl From<ZoneLevel> for ZoneAssignment {
    fn from(level: ZoneLevel) -> Self {
        match level {
            ZoneLevel::Zone1 => ZoneAssignment::Zone1,
            ZoneLevel::Zone2 => ZoneAssignment::Zone2,
            ZoneLevel::Zone3 => ZoneAssignment::Zone3,
        }
    }
}

impl fmt::Display for ZoneAssignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ZoneAssignment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ZoneAssignment::ALL
            .into_iter()
            .find(|a| a.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown zone label: {}", s))
    }
}

/// Feature brute lue depuis un fichier de zone
#[derive(Debug, Clone)]
pub struct RawZoneFeature {
    /// Identifiant de la feature (id GeoJSON ou rang dans le fichier)
    pub id: String,

    /// Géométrie, absente si la feature a une géométrie nulle
    pub geometry: Option<Geometry>,
}

/// Contenu d'un fichier de zone, avant normalisation
#[derive(Debug, Clone)]
pub struct ZoneSource {
    pub level: ZoneLevel,

    /// Code EPSG déclaré par le fichier (4326 si aucun)
    pub epsg: u32,

    /// Nom du fichier, pour les messages d'erreur
    pub origin: String,

    pub features: Vec<RawZoneFeature>,
}

/// Polygone simple issu de la normalisation
#[derive(Debug, Clone, PartialEq)]
pub struct ZonePolygon {
    /// `<id feature>#<partie>` pour les multipolygones éclatés
    pub id: String,
    pub polygon: Polygon,
}

impl From<ZonePolygon> for RawZoneFeature {
    fn from(zp: ZonePolygon) -> Self {
        Self {
            id: zp.id,
            geometry: Some(Geometry::Polygon(zp.polygon)),
        }
    }
}

/// Statistiques de normalisation d'une zone
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizeStats {
    /// Features lues
    pub features_read: usize,
    /// Features à géométrie nulle
    pub null_dropped: usize,
    /// Features non polygonales
    pub non_polygon_dropped: usize,
    /// Polygones dégénérés après simplification
    pub degenerate_dropped: usize,
    /// Polygones simples produits
    pub polygons_emitted: usize,
}

/// Zone normalisée, immuable après chargement
#[derive(Debug, Clone)]
pub struct Zone {
    pub level: ZoneLevel,
    pub tolerance: f64,
    pub polygons: Vec<ZonePolygon>,
    pub stats: NormalizeStats,
}

impl Zone {
    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

/// Zone après résolution des priorités
#[derive(Debug, Clone)]
pub struct ResolvedZone {
    pub level: ZoneLevel,
    pub geometry: MultiPolygon,
}

impl ResolvedZone {
    pub fn is_empty(&self) -> bool {
        self.geometry.0.is_empty()
    }
}

/// Code postal normalisé (5 chiffres si numérique)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct PostalCode(String);

impl PostalCode {
    /// Normalise une valeur brute : `38000.0` → `38000`, `1000` → `01000`
    pub fn normalize(raw: &str) -> Self {
        let trimmed = raw.trim().trim_matches('"').trim();
        // Les exports tableur écrivent parfois le code en flottant
        let integral = trimmed.split(['.', ',']).next().unwrap_or("");

        if !integral.is_empty() && integral.bytes().all(|b| b.is_ascii_digit()) {
            if integral.len() <= 5 {
                return Self(format!("{:0>5}", integral));
            }
            return Self(integral[..5].to_string());
        }

        Self(trimmed.chars().take(5).collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Code département déduit du code postal
    ///
    /// 2 chiffres en métropole, 3 pour l'outre-mer (97x, 98x),
    /// 2A/2B pour la Corse (200xx-201xx = Corse-du-Sud).
    pub fn department(&self) -> String {
        let code = self.0.as_str();
        if code.len() < 2 || !code.is_char_boundary(2) {
            return code.to_string();
        }

        let prefix = &code[..2];
        if prefix == "20" && code.len() >= 3 && code.is_char_boundary(3) {
            return if matches!(&code[2..3], "0" | "1") {
                "2A".to_string()
            } else {
                "2B".to_string()
            };
        }
        if (prefix == "97" || prefix == "98") && code.len() >= 3 && code.is_char_boundary(3) {
            return code[..3].to_string();
        }
        prefix.to_string()
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Clé composite d'une commune (nom + code postal)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CommuneKey {
    pub name: String,
    pub postal_code: PostalCode,
}

impl CommuneKey {
    pub fn new(name: impl Into<String>, postal_code: PostalCode) -> Self {
        Self {
            name: name.into(),
            postal_code,
        }
    }
}

/// Libellé de sélection : `Nom (CP)`
impl fmt::Display for CommuneKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.postal_code)
    }
}

/// Commune lue depuis la table
#[derive(Debug, Clone, PartialEq)]
pub struct Commune {
    pub name: String,
    pub postal_code: PostalCode,

    /// Position (lon, lat), absente si les coordonnées sont invalides
    pub location: Option<Point>,
}

impl Commune {
    pub fn key(&self) -> CommuneKey {
        CommuneKey::new(self.name.clone(), self.postal_code.clone())
    }

    pub fn department(&self) -> String {
        self.postal_code.department()
    }
}

/// Ligne de la table classifiée
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedCommune {
    pub name: String,
    pub postal_code: PostalCode,
    pub department: String,
    pub location: Option<Point>,
    pub zone: ZoneAssignment,
}

impl ClassifiedCommune {
    pub fn key(&self) -> CommuneKey {
        CommuneKey::new(self.name.clone(), self.postal_code.clone())
    }
}

/// Communes retenues par la jointure d'une zone
#[derive(Debug, Clone)]
pub struct ZoneMatches {
    pub level: ZoneLevel,
    pub keys: Vec<CommuneKey>,
}

/// Compteurs de l'agrégation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateStats {
    /// Communes sans position exploitable
    pub missing_location: usize,
    /// Lignes partageant une clé composite déjà vue
    pub duplicate_keys: usize,
    /// Communes retenues par plusieurs zones (la plus prioritaire gagne)
    pub cross_zone_overlaps: usize,
}

/// Table classifiée : une ligne par commune d'entrée, triée
#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub rows: Vec<ClassifiedCommune>,
    pub stats: AggregateStats,
}

impl Classification {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Nombre de communes par affectation
    pub fn count(&self, zone: ZoneAssignment) -> usize {
        self.rows.iter().filter(|r| r.zone == zone).count()
    }

    /// Recherche une commune par sa clé composite
    pub fn find(&self, key: &CommuneKey) -> Option<&ClassifiedCommune> {
        self.rows
            .iter()
            .find(|r| r.name == key.name && r.postal_code == key.postal_code)
    }

    /// Libellés de sélection `Nom (CP)`, triés et dédoublonnés
    pub fn options(&self) -> Vec<String> {
        let mut options: Vec<String> = self.rows.iter().map(|r| r.key().to_string()).collect();
        options.sort();
        options.dedup();
        options
    }

    /// Lignes affectées à une zone (hors `Hors zone`)
    pub fn classified(&self) -> impl Iterator<Item = &ClassifiedCommune> {
        self.rows.iter().filter(|r| r.zone.is_classified())
    }
}
