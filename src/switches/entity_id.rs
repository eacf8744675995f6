use std::fmt::Display;

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::configuration::DEFAULT_DEVICE_NAME;

pub const SWITCH_DOMAIN: &str = "switch";

lazy_static! {
    static ref NON_ALPHANUMERIC: Regex = Regex::new(r"[^a-z0-9]+").unwrap();
    static ref WAN_SWITCH_ID: Regex =
        Regex::new(r"^switch\.([a-z0-9_]+)_wan(\d+)_enable$").unwrap();
}

/// Lowercases and collapses every run of other characters into `_`.
pub fn slugify(value: &str) -> String {
    let lowered = value.to_lowercase();
    NON_ALPHANUMERIC
        .replace_all(&lowered, "_")
        .trim_matches('_')
        .to_string()
}

/// `switch.<device>_wan<id>_enable`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EntityId {
    pub device: String,
    pub wan_id: u32,
}

impl EntityId {
    /// Names without any ASCII letter or digit use the default device slug.
    pub fn new(device_name: &str, wan_id: u32) -> Self {
        let device = match slugify(device_name) {
            slug if slug.is_empty() => slugify(DEFAULT_DEVICE_NAME),
            slug => slug,
        };

        Self { device, wan_id }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let captures = WAN_SWITCH_ID.captures(value.trim())?;
        let device = captures.get(1)?.as_str().to_string();
        let wan_id = captures.get(2)?.as_str().parse::<u32>().ok()?;

        Some(Self { device, wan_id })
    }

    /// Identifier without the domain, stable across renames of the entity.
    pub fn object_id(&self) -> String {
        format!("{}_wan{}_enable", self.device, self.wan_id)
    }
}

impl Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", SWITCH_DOMAIN, self.object_id())
    }
}

#[cfg(test)]
mod tests {
    use super::{slugify, EntityId};

    #[test]
    fn slugify_tests() {
        assert_eq!("peplink", slugify("Peplink"));
        assert_eq!("balance_20x", slugify("Balance 20X"));
        assert_eq!("max_br1_mini", slugify("  MAX-BR1 (mini) "));
        assert_eq!("", slugify("---"));
    }

    #[test]
    fn entity_id_format() {
        assert_eq!("switch.peplink_wan2_enable", EntityId::new("Peplink", 2).to_string());
        assert_eq!(
            "switch.balance_20x_wan10_enable",
            EntityId::new("Balance 20X", 10).to_string()
        );
    }

    #[test]
    fn entity_id_parse() {
        let id = EntityId::parse("switch.peplink_wan3_enable").unwrap();
        assert_eq!("peplink", id.device);
        assert_eq!(3, id.wan_id);

        let id = EntityId::parse("switch.balance_20x_wan12_enable").unwrap();
        assert_eq!(EntityId::new("Balance 20X", 12), id);

        assert!(EntityId::parse("switch.peplink_wan_enable").is_none());
        assert!(EntityId::parse("light.peplink_wan3_enable").is_none());
        assert!(EntityId::parse("switch.peplink_wan3").is_none());
    }

    #[test]
    fn entity_id_of_unusable_device_name_stays_parseable() {
        for name in ["Маршрутизатор", "---", ""] {
            let id = EntityId::new(name, 1);

            assert_eq!("switch.peplink_wan1_enable", id.to_string());
            assert_eq!(Some(id.clone()), EntityId::parse(&id.to_string()));
        }
    }
}
