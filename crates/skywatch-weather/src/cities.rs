/// A city the backend collects observations for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct City {
    pub name: &'static str,
    /// OpenWeather city id
    pub id: u32,
}

pub const CITIES: &[City] = &[
    City { name: "Delhi", id: 1273294 },
    City { name: "Mumbai", id: 1275339 },
    City { name: "Chennai", id: 1264527 },
    City { name: "Bangalore", id: 1277333 },
    City { name: "Kolkata", id: 1275004 },
    City { name: "Hyderabad", id: 1269843 },
];

pub const DEFAULT_CITY: &str = "Delhi";

/// Case-insensitive lookup in [`CITIES`].
pub fn find_city(name: &str) -> Option<&'static City> {
    let name = name.trim();
    CITIES.iter().find(|c| c.name.eq_ignore_ascii_case(name))
}
