//! Reference table shipped with the crate.
//!
//! Covers every continent, a set of countries spread across them, and the
//! first-level subdivisions most edge deployments label their nodes with.
//! Operators extend it with `Gazetteer::merge`.

use crate::gazetteer::{ContinentRecord, CountryRecord, GazetteerData, SubdivisionRecord};

/// (code, name)
const CONTINENTS: &[(&str, &str)] = &[
    ("AF", "Africa"),
    ("AN", "Antarctica"),
    ("AS", "Asia"),
    ("EU", "Europe"),
    ("NA", "North America"),
    ("OC", "Oceania"),
    ("SA", "South America"),
];

/// (name, alpha-2, alpha-3, continent, aliases)
const COUNTRIES: &[(&str, &str, &str, &str, &[&str])] = &[
    ("Portugal", "PT", "PRT", "EU", &["Portuguese Republic"]),
    ("Spain", "ES", "ESP", "EU", &["España", "Espana"]),
    ("France", "FR", "FRA", "EU", &[]),
    ("Germany", "DE", "DEU", "EU", &["Deutschland"]),
    ("United Kingdom", "GB", "GBR", "EU", &["UK", "Great Britain"]),
    ("Ireland", "IE", "IRL", "EU", &[]),
    ("Italy", "IT", "ITA", "EU", &["Italia"]),
    ("Netherlands", "NL", "NLD", "EU", &["Holland"]),
    ("United States", "US", "USA", "NA", &["United States of America"]),
    ("Canada", "CA", "CAN", "NA", &[]),
    ("Mexico", "MX", "MEX", "NA", &[]),
    ("Brazil", "BR", "BRA", "SA", &["Brasil"]),
    ("Argentina", "AR", "ARG", "SA", &[]),
    ("Japan", "JP", "JPN", "AS", &[]),
    ("China", "CN", "CHN", "AS", &[]),
    ("India", "IN", "IND", "AS", &[]),
    ("Australia", "AU", "AUS", "OC", &[]),
    ("New Zealand", "NZ", "NZL", "OC", &[]),
    ("South Africa", "ZA", "ZAF", "AF", &[]),
    ("Egypt", "EG", "EGY", "AF", &[]),
    ("Antarctica", "AQ", "ATA", "AN", &[]),
];

/// (name, country alpha-2, region code, aliases)
const SUBDIVISIONS: &[(&str, &str, &str, &[&str])] = &[
    ("Aveiro", "PT", "01", &[]),
    ("Beja", "PT", "02", &[]),
    ("Braga", "PT", "03", &[]),
    ("Bragança", "PT", "04", &["Braganca"]),
    ("Castelo Branco", "PT", "05", &[]),
    ("Coimbra", "PT", "06", &[]),
    ("Évora", "PT", "07", &["Evora"]),
    ("Faro", "PT", "08", &[]),
    ("Guarda", "PT", "09", &[]),
    ("Leiria", "PT", "10", &[]),
    ("Lisboa", "PT", "11", &["Lisbon"]),
    ("Portalegre", "PT", "12", &[]),
    ("Porto", "PT", "13", &["Oporto"]),
    ("Santarém", "PT", "14", &["Santarem"]),
    ("Setúbal", "PT", "15", &["Setubal"]),
    ("Viana do Castelo", "PT", "16", &[]),
    ("Vila Real", "PT", "17", &[]),
    ("Viseu", "PT", "18", &[]),
    ("Madrid", "ES", "MD", &["Comunidad de Madrid"]),
    ("Barcelona", "ES", "B", &[]),
    ("Sevilla", "ES", "SE", &["Seville"]),
    ("Valencia", "ES", "V", &[]),
    ("Paris", "FR", "75", &[]),
    ("Berlin", "DE", "BE", &[]),
    ("Bayern", "DE", "BY", &["Bavaria"]),
    ("Hamburg", "DE", "HH", &[]),
    ("England", "GB", "ENG", &[]),
    ("Scotland", "GB", "SCT", &[]),
    ("Roma", "IT", "RM", &["Rome"]),
    ("Milano", "IT", "MI", &["Milan"]),
    ("California", "US", "CA", &[]),
    ("New York", "US", "NY", &[]),
    ("Texas", "US", "TX", &[]),
    ("Ontario", "CA", "ON", &[]),
    ("São Paulo", "BR", "SP", &["Sao Paulo"]),
    ("Rio de Janeiro", "BR", "RJ", &[]),
    ("Tokyo", "JP", "13", &["Tōkyō"]),
    ("New South Wales", "AU", "NSW", &[]),
    ("Gauteng", "ZA", "GP", &[]),
];

/// Build the builtin table.
pub fn data() -> GazetteerData {
    GazetteerData {
        continents: CONTINENTS
            .iter()
            .map(|(code, name)| ContinentRecord {
                code: code.to_string(),
                name: name.to_string(),
            })
            .collect(),
        countries: COUNTRIES
            .iter()
            .map(|(name, alpha2, alpha3, continent, aliases)| CountryRecord {
                name: name.to_string(),
                alpha2: alpha2.to_string(),
                alpha3: alpha3.to_string(),
                continent: continent.to_string(),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
            })
            .collect(),
        subdivisions: SUBDIVISIONS
            .iter()
            .map(|(name, country, code, aliases)| SubdivisionRecord {
                name: name.to_string(),
                country: country.to_string(),
                code: code.to_string(),
                aliases: aliases.iter().map(|a| a.to_string()).collect(),
            })
            .collect(),
    }
}
