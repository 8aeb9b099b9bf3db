//! Kit definition documents.
//!
//! Kits are defined in YAML. A definition is a mapping with `items`,
//! `effects` and `permissions` string lists, plus any attribute at its
//! storage path, where dots denote nesting:
//!
//! ```yaml
//! items: [iron_sword, "arrow:32"]
//! effects: ["speed:1"]
//! permissions: [warrior.rage]
//! parent: Base
//! timeout: 60
//! clear:
//!   inventory: true
//! ```
//!
//! `kits.yml` holds many kits keyed by name. A `<name>.kit` file holds one.
//! Loading is forgiving: an unreadable item, effect or attribute is logged
//! and dropped, and the rest of the kit still loads.

use std::fs;
use std::path::Path;

use kitmaster_core::{
    Attribute, AttributeValue, EffectCodec, ItemCodec, Kit,
};
use serde_yaml::{Mapping, Value};
use tracing::{error, warn};

use crate::error::{KitMasterError, Result};

/// Name of the combined kits document.
pub const KITS_DOCUMENT: &str = "kits.yml";

/// Extension of single-kit files.
pub const KIT_EXTENSION: &str = "kit";

/// Legacy flag that clears everything.
const LEGACY_CLEAR_INVENTORY: &str = "clearInventory";

/// Item and effect codec used while loading.
pub trait KitCodec: ItemCodec + EffectCodec {}

impl<T: ItemCodec + EffectCodec + ?Sized> KitCodec for T {}

/// Load every kit at `path`.
///
/// A directory yields `kits.yml` and every `*.kit` file inside it, in file
/// name order. A file that fails to load inside a directory is logged and
/// skipped. Any other file name yields nothing.
pub fn load_path(path: impl AsRef<Path>, codec: &dyn KitCodec) -> Result<Vec<Kit>> {
    let path = path.as_ref();

    if path.is_dir() {
        let mut children: Vec<_> = fs::read_dir(path)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|child| is_kits_document(child) || is_kit_file(child))
            .collect();
        children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let mut kits = Vec::new();
        for child in children {
            match load_file(&child, codec) {
                Ok(loaded) => kits.extend(loaded),
                Err(e) => warn!("Skipping {}: {}", child.display(), e),
            }
        }
        return Ok(kits);
    }

    if is_kits_document(path) || is_kit_file(path) {
        return load_file(path, codec);
    }
    Ok(Vec::new())
}

fn load_file(path: &Path, codec: &dyn KitCodec) -> Result<Vec<Kit>> {
    if is_kits_document(path) {
        load_kits_document(path, codec)
    } else {
        load_kit_file(path, codec).map(|kit| vec![kit])
    }
}

/// Load a document holding many kits keyed by name.
pub fn load_kits_document(path: impl AsRef<Path>, codec: &dyn KitCodec) -> Result<Vec<Kit>> {
    let path = path.as_ref();
    let document = read_yaml(path)?;

    let sections = match document {
        Value::Null => return Ok(Vec::new()),
        Value::Mapping(sections) => sections,
        _ => {
            return Err(KitMasterError::InvalidDefinition(format!(
                "{} is not a mapping of kit names",
                path.display()
            )))
        }
    };

    let mut kits = Vec::new();
    for (key, section) in &sections {
        let Some(name) = scalar_string(key) else {
            warn!("Skipping kit with non-scalar name {:?} in {}", key, path.display());
            continue;
        };
        match parse_kit(&name, section, codec) {
            Ok(kit) => kits.push(kit),
            Err(e) => warn!("Skipping kit {} in {}: {}", name, path.display(), e),
        }
    }
    Ok(kits)
}

/// Load a single-kit file. The kit is named after the file stem.
pub fn load_kit_file(path: impl AsRef<Path>, codec: &dyn KitCodec) -> Result<Kit> {
    let path = path.as_ref();
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| KitMasterError::InvalidDefinition(format!("{} has no kit name", path.display())))?;

    match read_yaml(path)? {
        // An empty file is an empty kit
        Value::Null => Ok(Kit::new(name)),
        section => parse_kit(name, &section, codec),
    }
}

/// Build a kit from its definition.
pub fn parse_kit(name: &str, section: &Value, codec: &dyn KitCodec) -> Result<Kit> {
    if !section.is_mapping() {
        return Err(KitMasterError::InvalidDefinition(format!(
            "the definition of kit {name} is not a mapping"
        )));
    }

    let mut kit = Kit::new(name);

    for entry in string_list(section, "items") {
        match codec.parse_item(&entry) {
            Ok(item) => kit.items.push(item),
            Err(e) => warn!("Dropping item from kit {}: {}", name, e),
        }
    }
    for entry in string_list(section, "effects") {
        match codec.parse_effect(&entry) {
            Ok(effect) => kit.effects.push(effect),
            Err(e) => warn!("Dropping effect from kit {}: {}", name, e),
        }
    }
    kit.permissions = string_list(section, "permissions");

    for attribute in Attribute::ALL {
        let Some(raw) = lookup(section, attribute.path()) else {
            continue;
        };
        let value = match raw {
            Value::Null => continue,
            Value::Bool(b) => AttributeValue::Boolean(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => AttributeValue::Integer(i),
                None => AttributeValue::Decimal(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => AttributeValue::Text(s.clone()),
            _ => {
                error!(
                    "Failed to define attribute {} for kit {}: the defined value was not a scalar",
                    attribute, name
                );
                continue;
            }
        };
        if let Err(e) = kit.attributes.set(attribute, value) {
            error!("Failed to define attribute {} for kit {}: {}", attribute, name, e);
        }
    }

    if section.get(LEGACY_CLEAR_INVENTORY).and_then(Value::as_bool) == Some(true) {
        kit.attributes.set(Attribute::ClearAll, true)?;
    }

    Ok(kit)
}

/// Serialize a kit back to its definition.
///
/// Only defined attributes are written.
pub fn to_definition(kit: &Kit, codec: &dyn KitCodec) -> Value {
    let mut root = Mapping::new();

    let list = |entries: Vec<String>| Value::Sequence(entries.into_iter().map(Value::String).collect());
    root.insert(
        "items".into(),
        list(kit.items.iter().map(|i| codec.format_item(i)).collect()),
    );
    root.insert(
        "effects".into(),
        list(kit.effects.iter().map(|e| codec.format_effect(e)).collect()),
    );
    root.insert("permissions".into(), list(kit.permissions.clone()));

    for (attribute, value) in kit.attributes.iter() {
        let value = match value {
            AttributeValue::Boolean(b) => Value::Bool(*b),
            AttributeValue::Integer(i) => Value::Number((*i).into()),
            AttributeValue::Decimal(d) => Value::Number((*d).into()),
            AttributeValue::Text(s) => Value::String(s.clone()),
        };
        insert_path(&mut root, attribute.path(), value);
    }

    Value::Mapping(root)
}

fn read_yaml(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)?;
    serde_yaml::from_str(&text).map_err(|e| KitMasterError::yaml(path, e))
}

fn is_kits_document(path: &Path) -> bool {
    path.is_file() && path.file_name().is_some_and(|name| name == KITS_DOCUMENT)
}

fn is_kit_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == KIT_EXTENSION)
}

fn lookup<'v>(section: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.').try_fold(section, |value, segment| value.get(segment))
}

fn insert_path(root: &mut Mapping, path: &str, value: Value) {
    let mut current = root;
    let mut segments = path.split('.').peekable();

    while let Some(segment) = segments.next() {
        let key = Value::String(segment.to_string());
        if segments.peek().is_none() {
            current.insert(key, value);
            return;
        }
        if !matches!(current.get(&key), Some(Value::Mapping(_))) {
            current.insert(key.clone(), Value::Mapping(Mapping::new()));
        }
        current = match current.get_mut(&key) {
            Some(Value::Mapping(inner)) => inner,
            _ => return,
        };
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(section: &Value, key: &str) -> Vec<String> {
    let Some(entries) = section.get(key).and_then(Value::as_sequence) else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| {
            let value = scalar_string(entry);
            if value.is_none() {
                warn!("Ignoring non-scalar {} entry {:?}", key, entry);
            }
            value
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use kitmaster_core::SimpleCodec;

    fn parse(name: &str, yaml: &str) -> Kit {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        parse_kit(name, &value, &SimpleCodec).unwrap()
    }

    #[test]
    fn test_parse_full_definition() {
        let kit = parse(
            "Archer",
            r#"
items: [bow, "arrow:32"]
effects: ["speed:1", "jump:0:1200"]
permissions: [archer.volley]
parent: Base
timeout: 60
cost: 25
clear:
  inventory: true
  effects: true
inherit:
  permissions: true
"#,
        );

        assert_eq!(kit.items.len(), 2);
        assert_eq!(kit.items[1].amount, 32);
        assert_eq!(kit.effects[1].duration_ticks, 1200);
        assert_eq!(kit.permissions, vec!["archer.volley"]);
        assert_eq!(kit.parent_name(), Some("Base"));
        assert_eq!(kit.timeout(), 60);
        assert_eq!(kit.cost(), 25.0);
        assert!(kit.flag(Attribute::ClearInventory));
        assert!(kit.flag(Attribute::ClearEffects));
        assert!(!kit.flag(Attribute::ClearPermissions));
        assert!(kit.flag(Attribute::InheritParentPerms));
    }

    #[test]
    fn test_bad_entries_are_dropped() {
        let kit = parse(
            "Broken",
            r#"
items: ["sword:lots", shield]
effects: ["speed:fast"]
timeout: soon
upgrade: true
"#,
        );

        assert_eq!(kit.items.len(), 1);
        assert_eq!(kit.items[0].material, "shield");
        assert!(kit.effects.is_empty());
        assert!(!kit.attributes.is_defined(Attribute::Timeout));
        assert!(kit.flag(Attribute::Upgrade));
    }

    #[test]
    fn test_legacy_clear_inventory() {
        let kit = parse("Old", "clearInventory: true\n");
        assert!(kit.flag(Attribute::ClearAll));
    }

    #[test]
    fn test_definition_round_trip() {
        let kit = parse(
            "Knight",
            r#"
items: ["iron_sword:1"]
effects: ["strength:1:600"]
permissions: [knight.charge]
identifier: "[Knight]"
timeout: -1
cash: 2.5
globalTimeout: true
require:
  permissions: true
"#,
        );

        let definition = to_definition(&kit, &SimpleCodec);
        let text = serde_yaml::to_string(&definition).unwrap();
        let reparsed = parse("Knight", &text);

        assert_eq!(reparsed.attributes, kit.attributes);
        assert_eq!(reparsed.items, kit.items);
        assert_eq!(reparsed.effects, kit.effects);
        assert_eq!(reparsed.permissions, kit.permissions);
    }

    #[test]
    fn test_non_mapping_is_invalid() {
        let value: Value = serde_yaml::from_str("[1, 2]").unwrap();
        assert!(matches!(
            parse_kit("List", &value, &SimpleCodec),
            Err(KitMasterError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn test_load_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join(KITS_DOCUMENT),
            "Warrior:\n  items: [iron_sword]\nArcher:\n  items: [bow]\n",
        )
        .unwrap();
        fs::write(dir.path().join("zealot.kit"), "parent: Warrior\n").unwrap();
        fs::write(dir.path().join("empty.kit"), "").unwrap();
        fs::write(dir.path().join("broken.kit"), "items: [unclosed\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "not a kit").unwrap();

        let kits = load_path(dir.path(), &SimpleCodec).unwrap();
        let names: Vec<_> = kits.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, vec!["empty", "Warrior", "Archer", "zealot"]);
        assert_eq!(kits[3].parent_name(), Some("Warrior"));
    }

    #[test]
    fn test_load_single_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Scout.kit");
        fs::write(&path, "items: [\"feather:3\"]\n").unwrap();

        let kits = load_path(&path, &SimpleCodec).unwrap();
        assert_eq!(kits.len(), 1);
        assert_eq!(kits[0].name, "Scout");

        assert!(load_path(dir.path().join("absent.kit"), &SimpleCodec).unwrap().is_empty());
        assert!(matches!(
            load_kit_file(dir.path().join("absent.kit"), &SimpleCodec),
            Err(KitMasterError::Io(_))
        ));
    }
}
