//! Defensive parsing of stored roster documents.
//!
//! Stores hold organisms as loose JSON written by many clients over time.
//! [`parse_roster`] keeps every entry that can be scored and reports the
//! rest instead of failing the whole roster.
//!
//! Kept entries are normalized:
//! - stat keys outside the kingdom vocabulary are dropped
//! - stat values are clamped to `0..=5`
//! - inherent stats are forced to 5
//! - an unknown or missing status becomes `alive`

use std::fmt;

use log::{debug, warn};
use serde_json::{Map, Value};

use crate::catalog::{inherent_stats, is_available, Environment, Kingdom, Stat};
use crate::constants::{INHERENT_STAT_VALUE, MAX_STAT_VALUE};
use crate::organism::{Organism, OrganismStatus, StatMap};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    NotAnObject,
    MissingName,
    MissingKingdom,
    UnknownKingdom(String),
    MissingEnvironment,
    UnknownEnvironment(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => write!(f, "entry is not an object"),
            Self::MissingName => write!(f, "missing or blank name"),
            Self::MissingKingdom => write!(f, "missing kingdom"),
            Self::UnknownKingdom(k) => write!(f, "unknown kingdom '{k}'"),
            Self::MissingEnvironment => write!(f, "missing environment"),
            Self::UnknownEnvironment(e) => write!(f, "unknown environment '{e}'"),
        }
    }
}

/// A document that could not be turned into an organism.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedEntry {
    /// Position in the input slice.
    pub index: usize,
    pub id: Option<String>,
    pub reason: RejectReason,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedRoster {
    pub organisms: Vec<Organism>,
    pub rejected: Vec<RejectedEntry>,
}

/// Parse every document, keeping the well-formed ones in input order.
pub fn parse_roster(docs: &[Value]) -> ParsedRoster {
    let mut roster = ParsedRoster::default();

    for (index, doc) in docs.iter().enumerate() {
        match parse_organism(doc) {
            Ok(org) => roster.organisms.push(org),
            Err(reason) => {
                let id = doc.get("id").and_then(id_string);
                warn!("Skipping roster entry {} ({:?}): {}", index, id, reason);
                roster.rejected.push(RejectedEntry { index, id, reason });
            }
        }
    }

    roster
}

/// Parse one stored organism document.
pub fn parse_organism(doc: &Value) -> Result<Organism, RejectReason> {
    let obj = doc.as_object().ok_or(RejectReason::NotAnObject)?;

    let name = obj
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or(RejectReason::MissingName)?;

    let kingdom_raw = obj
        .get("kingdom")
        .and_then(Value::as_str)
        .ok_or(RejectReason::MissingKingdom)?;
    let kingdom: Kingdom = kingdom_raw
        .parse()
        .map_err(|_| RejectReason::UnknownKingdom(kingdom_raw.to_string()))?;

    let env_raw = obj
        .get("environment")
        .and_then(Value::as_str)
        .ok_or(RejectReason::MissingEnvironment)?;
    let environment: Environment = env_raw
        .parse()
        .map_err(|_| RejectReason::UnknownEnvironment(env_raw.to_string()))?;

    let status = obj
        .get("status")
        .and_then(|s| serde_json::from_value::<OrganismStatus>(s.clone()).ok())
        .unwrap_or_default();

    Ok(Organism {
        id: obj.get("id").and_then(id_string),
        name: name.to_string(),
        kingdom,
        environment,
        stats: normalize_stats(obj.get("stats").and_then(Value::as_object), kingdom),
        status,
        player_name: obj
            .get("playerName")
            .and_then(Value::as_str)
            .map(str::to_string),
    })
}

fn normalize_stats(raw: Option<&Map<String, Value>>, kingdom: Kingdom) -> StatMap {
    let mut stats = StatMap::new();

    for (key, value) in raw.into_iter().flatten() {
        let stat = match key.parse::<Stat>() {
            Ok(s) if is_available(kingdom, s) => s,
            _ => {
                debug!("Dropping stat '{}' not in {} vocabulary", key, kingdom);
                continue;
            }
        };
        let Some(n) = value.as_f64() else {
            debug!("Dropping non-numeric stat '{}'", key);
            continue;
        };
        stats.insert(stat, n.clamp(0.0, MAX_STAT_VALUE as f64) as u8);
    }

    for &stat in inherent_stats(kingdom) {
        stats.insert(stat, INHERENT_STAT_VALUE);
    }

    stats
}

fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Store representation of an organism.
pub fn to_document(organism: &Organism) -> Value {
    // Organism has only string keys and plain values, so this cannot fail.
    serde_json::to_value(organism).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn well_formed_entry_parses() {
        let doc = json!({
            "id": "org-1",
            "name": "Gazelle",
            "kingdom": "Animal",
            "environment": "Grassland",
            "stats": { "agility": 5, "resilience": 3, "locomotion": 5 },
            "status": "thriving",
            "playerName": "Ana"
        });
        let org = parse_organism(&doc).unwrap();
        assert_eq!(org.id.as_deref(), Some("org-1"));
        assert_eq!(org.stat(Stat::Agility), 5);
        assert_eq!(org.status, OrganismStatus::Thriving);
        assert_eq!(org.player_name.as_deref(), Some("Ana"));
    }

    #[test]
    fn malformed_entries_are_reported_not_fatal() {
        let docs = vec![
            json!({ "name": "Good", "kingdom": "Fungi", "environment": "Jungle" }),
            json!({ "name": "   ", "kingdom": "Fungi", "environment": "Jungle" }),
            json!({ "id": 7, "name": "NoKingdom", "environment": "Jungle" }),
            json!({ "name": "Alien", "kingdom": "Virus", "environment": "Jungle" }),
            json!({ "name": "Lost", "kingdom": "Plant", "environment": "Ocean" }),
            json!("just a string"),
        ];
        let roster = parse_roster(&docs);
        assert_eq!(roster.organisms.len(), 1);
        assert_eq!(roster.organisms[0].name, "Good");

        let reasons: Vec<_> = roster.rejected.iter().map(|r| r.reason.clone()).collect();
        assert_eq!(
            reasons,
            vec![
                RejectReason::MissingName,
                RejectReason::MissingKingdom,
                RejectReason::UnknownKingdom("Virus".into()),
                RejectReason::UnknownEnvironment("Ocean".into()),
                RejectReason::NotAnObject,
            ]
        );
        assert_eq!(roster.rejected[1].id.as_deref(), Some("7"));
        assert_eq!(roster.rejected[1].index, 2);
    }

    #[test]
    fn stats_are_normalized() {
        let doc = json!({
            "name": "Spore",
            "kingdom": "Fungi",
            "environment": "Jungle",
            "stats": {
                "decomposer": 1,
                "parasitic": 9,
                "sporeDispersal": -2,
                "agility": 4,
                "wingspan": 3,
                "fertility": "lots"
            }
        });
        let org = parse_organism(&doc).unwrap();
        assert_eq!(org.stat(Stat::Decomposer), 5);
        assert_eq!(org.stat(Stat::Parasitic), 5);
        assert_eq!(org.stat(Stat::SporeDispersal), 0);
        assert!(!org.stats.contains_key(&Stat::Agility));
        assert!(!org.stats.contains_key(&Stat::Fertility));
    }

    #[test]
    fn missing_stats_still_get_inherent() {
        let doc = json!({ "name": "B", "kingdom": "Bacteria", "environment": "Desert" });
        let org = parse_organism(&doc).unwrap();
        assert_eq!(org.stat(Stat::Mutation), 5);
        assert_eq!(org.stat(Stat::HorizontalGeneTransfer), 5);
        assert_eq!(org.stats.len(), 2);
    }

    #[test]
    fn unknown_status_becomes_alive() {
        let doc = json!({
            "name": "X",
            "kingdom": "Protist",
            "environment": "Tundra",
            "status": "zombie"
        });
        assert_eq!(parse_organism(&doc).unwrap().status, OrganismStatus::Alive);
    }

    #[test]
    fn document_round_trip_keeps_organism() {
        let mut org = Organism::new("Moss", Kingdom::Plant, Environment::Tundra);
        org.set_stat(Stat::RootDepth, 3).unwrap();
        org.id = Some("o1".into());
        let back = parse_organism(&to_document(&org)).unwrap();
        assert_eq!(back, org);
    }
}
