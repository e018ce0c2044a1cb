//! Location catalog: parsing the pipe-delimited data file and holding the
//! lock state of every location.
//!
//! Record layout, one per non-blank line:
//!
//! ```text
//! name|description|hint|accessible|action|task hint
//! ```
//!
//! `|` cannot be escaped. A field that contains it shifts every later field.

use std::collections::HashSet;

use super::error::ParseError;
use super::tasks::TaskRegistry;

const FIELD_COUNT: usize = 6;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    pub description: String,
    pub hint: String,
    pub is_accessible: bool,
    /// Identifier of a registered task. `None` when the field is empty.
    pub action: Option<String>,
    pub task_hint: String,
}

/// Parse the raw data file. Result order is input line order.
pub fn parse_locations(raw: &str) -> Result<Vec<Location>, ParseError> {
    if raw.trim().is_empty() {
        return Err(ParseError::EmptyDataset);
    }

    let mut seen = HashSet::new();
    let mut locations = Vec::new();

    for (index, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let location = parse_record(line).ok_or_else(|| ParseError::MalformedRecord {
            line: index + 1,
            record: line.to_string(),
        })?;
        if !seen.insert(location.name.clone()) {
            return Err(ParseError::DuplicateName(location.name));
        }
        locations.push(location);
    }

    Ok(locations)
}

fn parse_record(line: &str) -> Option<Location> {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() < FIELD_COUNT {
        return None;
    }
    let action = match fields[4] {
        "" => None,
        id => Some(id.to_string()),
    };
    Some(Location {
        name: fields[0].to_string(),
        description: fields[1].to_string(),
        hint: fields[2].to_string(),
        is_accessible: fields[3] == "true",
        action,
        task_hint: fields[5].to_string(),
    })
}

/// The loaded locations. Only `is_accessible` ever changes, and only from
/// `false` to `true`.
#[derive(Clone, Debug)]
pub struct Catalog {
    locations: Vec<Location>,
}

impl Catalog {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        Ok(Self {
            locations: parse_locations(raw)?,
        })
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn find(&self, name: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.name == name)
    }

    pub fn get(&self, index: usize) -> Option<&Location> {
        self.locations.get(index)
    }

    /// Unlock a location by name. Returns true only if it was locked before.
    /// Unknown names are a no-op.
    pub fn unlock(&mut self, name: &str) -> bool {
        match self.locations.iter_mut().find(|l| l.name == name) {
            Some(location) if !location.is_accessible => {
                location.is_accessible = true;
                true
            }
            _ => false,
        }
    }

    /// Names of every currently accessible location, in catalog order.
    pub fn unlocked_names(&self) -> Vec<String> {
        self.locations
            .iter()
            .filter(|l| l.is_accessible)
            .map(|l| l.name.clone())
            .collect()
    }

    /// `(location, action)` pairs whose action has no registered handler.
    pub fn unknown_actions<'a>(&'a self, registry: &TaskRegistry) -> Vec<(&'a str, &'a str)> {
        self.locations
            .iter()
            .filter_map(|l| {
                let action = l.action.as_deref()?;
                (!registry.contains(action)).then_some((l.name.as_str(), action))
            })
            .collect()
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn field() -> impl Strategy<Value = String> {
        "[^|\r\n]{0,12}"
    }

    proptest! {
        #[test]
        fn well_formed_line_round_trips(
            name in "[^|\r\n]{1,12}".prop_filter("non-blank", |s| !s.trim().is_empty()),
            description in field(),
            hint in field(),
            flag in prop_oneof![Just("true".to_string()), field()],
            action in "[A-Za-z]{1,10}",
            task_hint in field(),
        ) {
            let line = format!("{name}|{description}|{hint}|{flag}|{action}|{task_hint}");
            let locations = parse_locations(&line).unwrap();
            prop_assert_eq!(locations.len(), 1);
            let l = &locations[0];
            prop_assert_eq!(&l.name, &name);
            prop_assert_eq!(&l.description, &description);
            prop_assert_eq!(&l.hint, &hint);
            prop_assert_eq!(l.is_accessible, flag == "true");
            prop_assert_eq!(l.action.as_deref(), Some(action.as_str()));
            prop_assert_eq!(&l.task_hint, &task_hint);
        }

        #[test]
        fn five_field_line_is_always_malformed(
            fields in prop::collection::vec(field(), 5),
        ) {
            let line = fields.join("|");
            prop_assume!(!line.trim().is_empty());
            let is_malformed = matches!(
                parse_locations(&line),
                Err(ParseError::MalformedRecord { .. })
            );
            prop_assert!(is_malformed);
        }
    }
}
