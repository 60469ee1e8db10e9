use std::collections::HashMap;
use std::fs;

use epitrace::prelude::*;
use log::info;
use serde::{Deserialize, Serialize};

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    contacts_path: String,
    community_path: Option<String>,
    model: Model,
    seir: SeirParams,
    airborne: AirborneParams,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Model {
    Seir,
    Airborne,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            contacts_path: "contacts.csv".to_string(),
            community_path: None,
            model: Model::Seir,
            seir: SeirParams::default(),
            airborne: AirborneParams::default(),
        }
    }
}

/// Parses `timestamp,u,v` lines, one contact per line, blank lines ignored.
/// Ingestion proper (format sniffing, ID normalization) is an external
/// collaborator; this is the minimal reader a CLI demo needs.
fn read_contacts(path: &str) -> Vec<ContactEvent> {
    let raw = fs::read_to_string(path).unwrap_or_default();
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields = line.split(',').map(|f| f.trim());
            let timestamp: Time = fields.next().unwrap().parse().unwrap();
            let u: Id = fields.next().unwrap().parse().unwrap();
            let v: Id = fields.next().unwrap().parse().unwrap();
            ContactEvent::new(timestamp, u, v)
        })
        .collect()
}

/// Parses `id,zone` lines. Community detection itself is out of scope; this
/// reads its output.
fn read_community(path: &str) -> HashMap<Id, ZoneId> {
    let raw = fs::read_to_string(path).unwrap_or_default();
    raw.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let mut fields = line.split(',').map(|f| f.trim());
            let id: Id = fields.next().unwrap().parse().unwrap();
            let zone: ZoneId = fields.next().unwrap().parse().unwrap();
            (id, zone)
        })
        .collect()
}

pub fn main() {
    use simple_logger::SimpleLogger;
    SimpleLogger::new().init().unwrap();

    let cfg_data = fs::read_to_string("conf.toml").unwrap();
    let cfg: Config = toml::from_str(&cfg_data).unwrap();
    info!("loaded config: {:#?}", cfg);

    let contacts = read_contacts(&cfg.contacts_path);

    match cfg.model {
        Model::Seir => {
            let driver = Driver::seir(&contacts, cfg.seir);
            for delta in driver {
                println!("{}", serde_json::to_string(&delta).unwrap());
            }
        }
        Model::Airborne => {
            let community = cfg
                .community_path
                .as_deref()
                .map(read_community)
                .unwrap_or_default();
            let driver = Driver::airborne(&contacts, cfg.airborne, &community);
            for delta in driver {
                println!("{}", serde_json::to_string(&delta).unwrap());
            }
        }
    }
}
