use serde::Serialize;
use url::Url;

use crate::error::{Error, ErrorDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum StoreChain {
    Publix,
    WinnDixie,
    WholeFoods,
}

impl StoreChain {
    pub fn search_host(&self) -> &'static str {
        match self {
            StoreChain::Publix => "www.publix.com",
            StoreChain::WinnDixie => "www.winndixie.com",
            StoreChain::WholeFoods => "www.wholefoodsmarket.com",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StoreChain::Publix => "Publix",
            StoreChain::WinnDixie => "Winn-Dixie",
            StoreChain::WholeFoods => "Whole Foods Market",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Store {
    pub id: &'static str,
    pub name: &'static str,
    pub chain: StoreChain,
    pub zip_code: &'static str,
    pub latitude: f64,
    pub longitude: f64,
}

impl Store {
    /// Deterministic search URL for a product on this store's site.
    pub fn search_url(&self, product: &str) -> Result<Url, Error> {
        let base = format!("https://{}/search", self.chain.search_host());
        Url::parse_with_params(&base, &[("query", product)]).map_err(|e| {
            Error::new(ErrorDetails::InternalError {
                message: format!("Failed to build search URL for store {}: {e}", self.id),
            })
        })
    }
}

/// Florida store directory. Small and static: the price comparison feature
/// only covers a fixed set of stores around the supported zip codes.
pub const STORE_DIRECTORY: &[Store] = &[
    Store {
        id: "publix-0982",
        name: "Publix Super Market at Brickell",
        chain: StoreChain::Publix,
        zip_code: "33130",
        latitude: 25.7661,
        longitude: -80.1937,
    },
    Store {
        id: "publix-1124",
        name: "Publix Super Market at Miami Beach",
        chain: StoreChain::Publix,
        zip_code: "33139",
        latitude: 25.7906,
        longitude: -80.1351,
    },
    Store {
        id: "publix-0456",
        name: "Publix Super Market at Coral Way",
        chain: StoreChain::Publix,
        zip_code: "33145",
        latitude: 25.7502,
        longitude: -80.2203,
    },
    Store {
        id: "publix-0841",
        name: "Publix Super Market at Pinecrest",
        chain: StoreChain::Publix,
        zip_code: "33158",
        latitude: 25.6373,
        longitude: -80.3185,
    },
    Store {
        id: "publix-0533",
        name: "Publix Super Market at Palm Beach",
        chain: StoreChain::Publix,
        zip_code: "33480",
        latitude: 26.7056,
        longitude: -80.0364,
    },
    Store {
        id: "publix-0719",
        name: "Publix Super Market at Edgewood",
        chain: StoreChain::Publix,
        zip_code: "32209",
        latitude: 30.3658,
        longitude: -81.6852,
    },
    Store {
        id: "winn-dixie-0231",
        name: "Winn-Dixie Little Havana",
        chain: StoreChain::WinnDixie,
        zip_code: "33125",
        latitude: 25.7785,
        longitude: -80.2377,
    },
    Store {
        id: "winn-dixie-0377",
        name: "Winn-Dixie Allapattah",
        chain: StoreChain::WinnDixie,
        zip_code: "33142",
        latitude: 25.8103,
        longitude: -80.2381,
    },
    Store {
        id: "wholefoods-10235",
        name: "Whole Foods Market Downtown Miami",
        chain: StoreChain::WholeFoods,
        zip_code: "33131",
        latitude: 25.7689,
        longitude: -80.1896,
    },
];

/// Map a zip code to the store that serves it. Zip codes without their own
/// store resolve to the closest one we cover; anything else is not served.
fn store_id_for_zip(zip_code: &str) -> Option<&'static str> {
    match zip_code {
        "33130" | "33129" | "33128" => Some("publix-0982"),
        "33139" | "33109" | "33140" => Some("publix-1124"),
        "33145" | "33133" | "33135" => Some("publix-0456"),
        "33158" | "33156" => Some("publix-0841"),
        "33480" => Some("publix-0533"),
        "32209" => Some("publix-0719"),
        "33125" => Some("winn-dixie-0231"),
        "33142" | "33147" => Some("winn-dixie-0377"),
        "33131" | "33132" => Some("wholefoods-10235"),
        _ => None,
    }
}

pub fn resolve_store(zip_code: &str) -> Option<&'static Store> {
    let id = store_id_for_zip(zip_code)?;
    STORE_DIRECTORY.iter().find(|store| store.id == id)
}

/// Approximate centroid of a supported zip code, for the radius filter.
fn zip_centroid(zip_code: &str) -> Option<(f64, f64)> {
    match zip_code {
        "33128" => Some((25.7782, -80.2017)),
        "33129" => Some((25.7534, -80.2044)),
        "33130" => Some((25.7680, -80.2044)),
        "33131" => Some((25.7670, -80.1869)),
        "33132" => Some((25.7846, -80.1806)),
        "33133" => Some((25.7304, -80.2430)),
        "33135" => Some((25.7662, -80.2345)),
        "33109" => Some((25.7613, -80.1390)),
        "33139" => Some((25.7847, -80.1344)),
        "33140" => Some((25.8171, -80.1263)),
        "33125" => Some((25.7790, -80.2370)),
        "33142" => Some((25.8128, -80.2377)),
        "33145" => Some((25.7525, -80.2233)),
        "33147" => Some((25.8504, -80.2374)),
        "33156" => Some((25.6672, -80.2966)),
        "33158" => Some((25.6374, -80.3089)),
        "33480" => Some((26.6990, -80.0377)),
        "32209" => Some((30.3659, -81.6988)),
        _ => None,
    }
}

const EARTH_RADIUS_MILES: f64 = 3958.8;

fn haversine_miles(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_MILES * a.sqrt().asin()
}

/// Stores within `radius_miles` of a zip code, closest first.
///
/// An unsupported zip code yields an empty list, which callers surface as an
/// empty comparison rather than an error.
pub fn stores_near(zip_code: &str, radius_miles: f64) -> Vec<(&'static Store, f64)> {
    let Some((lat, lon)) = zip_centroid(zip_code) else {
        return Vec::new();
    };

    let mut nearby: Vec<(&'static Store, f64)> = STORE_DIRECTORY
        .iter()
        .map(|store| {
            (
                store,
                haversine_miles(lat, lon, store.latitude, store.longitude),
            )
        })
        .filter(|(_, distance)| *distance <= radius_miles)
        .collect();
    nearby.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    nearby
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_store_known_zip() {
        let store = resolve_store("33130").unwrap();
        assert_eq!(store.id, "publix-0982");
        assert_eq!(store.chain, StoreChain::Publix);
    }

    #[test]
    fn test_resolve_store_alias_zip() {
        let store = resolve_store("33109").unwrap();
        assert_eq!(store.id, "publix-1124");
    }

    #[test]
    fn test_resolve_store_unknown_zip() {
        assert!(resolve_store("00000").is_none());
        assert!(resolve_store("90210").is_none());
    }

    #[test]
    fn test_search_url_is_deterministic_and_encoded() {
        let store = resolve_store("33130").unwrap();
        let url = store.search_url("orange juice").unwrap();

        assert_eq!(
            url.as_str(),
            "https://www.publix.com/search?query=orange+juice"
        );
    }

    #[test]
    fn test_stores_near_downtown_miami() {
        let nearby = stores_near("33130", 5.0);

        assert!(!nearby.is_empty());
        // Closest first
        for pair in nearby.windows(2) {
            assert!(pair[0].1 <= pair[1].1);
        }
        // Palm Beach and Jacksonville are far outside a 5 mile radius
        assert!(nearby.iter().all(|(store, _)| store.id != "publix-0533"));
        assert!(nearby.iter().all(|(store, _)| store.id != "publix-0719"));
    }

    #[test]
    fn test_stores_near_unknown_zip_is_empty() {
        assert!(stores_near("00000", 50.0).is_empty());
    }

    #[test]
    fn test_directory_zips_resolve_to_themselves() {
        for store in STORE_DIRECTORY {
            let resolved = resolve_store(store.zip_code).unwrap();
            assert_eq!(resolved.id, store.id);
        }
    }
}
