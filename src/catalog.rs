//! Read-only city registry with map coordinates.
//!
//! A [`CityCatalog`] is built once at startup (from a built-in set or an
//! explicit list) and shared by reference; nothing mutates it afterwards.

use serde::Serialize;

/// Geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// A city known to the simulator and the map view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct City {
    pub name: String,
    pub coordinates: Coordinates,
}

impl City {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            coordinates: Coordinates {
                latitude,
                longitude,
            },
        }
    }
}

/// Ordered, immutable city → coordinates lookup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CityCatalog {
    cities: Vec<City>,
}

/// The ten largest Turkish cities by population.
const TURKEY_10: &[(&str, f64, f64)] = &[
    ("Istanbul", 41.0082, 28.9784),
    ("Ankara", 39.9334, 32.8597),
    ("Izmir", 38.4237, 27.1428),
    ("Bursa", 40.1950, 29.0600),
    ("Adana", 37.0000, 35.3213),
    ("Gaziantep", 37.0662, 37.3833),
    ("Konya", 37.8746, 32.4932),
    ("Antalya", 36.8969, 30.7133),
    ("Kayseri", 38.7225, 35.4875),
    ("Mersin", 36.8121, 34.6415),
];

/// All 81 Turkish provinces (approximate provincial capitals).
const TURKEY_81: &[(&str, f64, f64)] = &[
    ("Adana", 37.0000, 35.3213),
    ("Adiyaman", 37.7648, 38.2769),
    ("Afyonkarahisar", 38.7638, 30.5403),
    ("Agri", 39.7191, 43.0519),
    ("Amasya", 40.6499, 35.8353),
    ("Ankara", 39.9334, 32.8597),
    ("Antalya", 36.8969, 30.7133),
    ("Artvin", 41.1828, 41.8194),
    ("Aydin", 37.8400, 27.8447),
    ("Balikesir", 39.6484, 27.8826),
    ("Bilecik", 40.1500, 29.9833),
    ("Bingol", 39.0626, 40.7696),
    ("Bitlis", 38.3938, 42.1235),
    ("Bolu", 40.7395, 31.6116),
    ("Burdur", 37.7203, 30.2908),
    ("Bursa", 40.1950, 29.0600),
    ("Canakkale", 40.1467, 26.4100),
    ("Cankiri", 40.6000, 33.6167),
    ("Corum", 40.5506, 34.9556),
    ("Denizli", 37.7833, 29.0937),
    ("Diyarbakir", 37.9144, 40.2306),
    ("Edirne", 41.6771, 26.5553),
    ("Elazig", 38.6752, 39.2232),
    ("Erzincan", 39.7520, 39.4928),
    ("Erzurum", 39.9043, 41.2679),
    ("Eskisehir", 39.7767, 30.5206),
    ("Gaziantep", 37.0662, 37.3833),
    ("Giresun", 40.9128, 38.3895),
    ("Gumushane", 40.4603, 39.4814),
    ("Hakkari", 37.5833, 43.7333),
    ("Hatay", 36.2028, 36.1600),
    ("Isparta", 37.7648, 30.5566),
    ("Mersin", 36.8065, 34.6400),
    ("Istanbul", 41.0082, 28.9784),
    ("Izmir", 38.4237, 27.1428),
    ("Kars", 40.6100, 43.0975),
    ("Kastamonu", 41.3887, 33.7827),
    ("Kayseri", 38.7225, 35.4875),
    ("Kirklareli", 41.7351, 27.2249),
    ("Kirsehir", 39.1480, 34.1685),
    ("Kocaeli", 40.8533, 29.8815),
    ("Konya", 37.8722, 32.4923),
    ("Kutahya", 39.4242, 29.9833),
    ("Malatya", 38.3552, 38.3095),
    ("Manisa", 38.6191, 27.4289),
    ("Kahramanmaras", 37.5858, 36.9371),
    ("Mardin", 37.3128, 40.7339),
    ("Mugla", 37.2153, 28.3636),
    ("Mus", 38.9462, 41.7539),
    ("Nevsehir", 38.6248, 34.7179),
    ("Nigde", 37.9662, 34.6796),
    ("Ordu", 40.9862, 37.8797),
    ("Rize", 41.0201, 40.5234),
    ("Sakarya", 40.7419, 30.3270),
    ("Samsun", 41.2928, 36.3313),
    ("Siirt", 37.9450, 41.9403),
    ("Sinop", 42.0268, 35.1628),
    ("Sivas", 39.7477, 37.0179),
    ("Tekirdag", 40.9599, 27.5152),
    ("Tokat", 40.3141, 36.5540),
    ("Trabzon", 41.0030, 39.7168),
    ("Tunceli", 39.1081, 39.5483),
    ("Sanliurfa", 37.1671, 38.7955),
    ("Usak", 38.6823, 29.4082),
    ("Van", 38.5012, 43.3662),
    ("Yozgat", 39.8209, 34.8085),
    ("Zonguldak", 41.4564, 31.7987),
    ("Aksaray", 38.3687, 34.0360),
    ("Bayburt", 40.2583, 40.2279),
    ("Karaman", 37.1811, 33.2150),
    ("Kirikkale", 39.8468, 33.5153),
    ("Batman", 37.8812, 41.1351),
    ("Sirnak", 37.4187, 42.4918),
    ("Bartin", 41.6350, 32.3370),
    ("Ardahan", 41.1105, 42.7022),
    ("Igdir", 39.9237, 44.0400),
    ("Yalova", 40.6500, 29.2667),
    ("Karabuk", 41.2061, 32.6204),
    ("Kilis", 36.7184, 37.1150),
    ("Osmaniye", 37.0742, 36.2475),
    ("Duzce", 40.8438, 31.1565),
];

impl CityCatalog {
    /// Names accepted by [`CityCatalog::builtin`].
    pub const BUILTIN: &[&str] = &["turkey10", "turkey81"];

    pub fn new(cities: Vec<City>) -> Self {
        Self { cities }
    }

    /// Returns a built-in catalog by name.
    pub fn builtin(name: &str) -> Option<Self> {
        let table = match name {
            "turkey10" => TURKEY_10,
            "turkey81" => TURKEY_81,
            _ => return None,
        };
        Some(Self::new(
            table
                .iter()
                .map(|&(name, lat, lon)| City::new(name, lat, lon))
                .collect(),
        ))
    }

    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cities.iter().map(|c| c.name.as_str())
    }

    pub fn get(&self, name: &str) -> Option<&City> {
        self.cities.iter().find(|c| c.name == name)
    }

    pub fn coordinates(&self, name: &str) -> Option<Coordinates> {
        self.get(name).map(|c| c.coordinates)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Catalog restricted to `names`, in the order given; unknown names are
    /// dropped.
    pub fn subset<S: AsRef<str>>(&self, names: &[S]) -> Self {
        Self::new(
            names
                .iter()
                .filter_map(|n| self.get(n.as_ref()).cloned())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.cities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.is_empty()
    }
}

/// Folds a city name for fuzzy matching: Turkish letters to ASCII,
/// lowercase, whitespace removed.
///
/// # Examples
///
/// ```
/// use meter_analytics::catalog::normalize_name;
///
/// assert_eq!(normalize_name("İstanbul"), "istanbul");
/// assert_eq!(normalize_name("Şanlı Urfa"), "sanliurfa");
/// ```
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .filter_map(|c| match c {
            'ç' | 'Ç' => Some('c'),
            'ğ' | 'Ğ' => Some('g'),
            'ı' | 'İ' | 'î' | 'Î' => Some('i'),
            'ö' | 'Ö' => Some('o'),
            'ş' | 'Ş' => Some('s'),
            'ü' | 'Ü' | 'û' | 'Û' => Some('u'),
            'â' | 'Â' => Some('a'),
            c if c.is_ascii() => Some(c.to_ascii_lowercase()),
            _ => None,
        })
        .collect()
}
