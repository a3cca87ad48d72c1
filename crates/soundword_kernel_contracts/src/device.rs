#![forbid(unsafe_code)]

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::trial::LogicalResponse;
use crate::{ContractViolation, MonotonicTimeNs, Validate};

/// Normalised keyboard key name (`"y"`, `"n"`, `"space"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct KeyName(String);

impl KeyName {
    pub fn new(v: impl AsRef<str>) -> Result<Self, ContractViolation> {
        let k = Self(v.as_ref().trim().to_ascii_lowercase());
        k.validate()?;
        Ok(k)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Validate for KeyName {
    fn validate(&self) -> Result<(), ContractViolation> {
        if self.0.is_empty() {
            return Err(ContractViolation::InvalidValue {
                field: "key_name",
                reason: "must not be empty",
            });
        }
        if self.0.len() > 32 || self.0.chars().any(char::is_whitespace) {
            return Err(ContractViolation::InvalidValue {
                field: "key_name",
                reason: "must be a short token without whitespace",
            });
        }
        Ok(())
    }
}

/// Physical gamepad input: a button index or a hat (d-pad) position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GamepadCode {
    Button(u8),
    Hat { x: i8, y: i8 },
}

impl FromStr for GamepadCode {
    type Err = ContractViolation;

    /// Parses `button:N` or `hat:X,Y` with X and Y in -1..=1.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = ContractViolation::InvalidValue {
            field: "gamepad_code",
            reason: "expected button:N or hat:X,Y",
        };
        let (kind, rest) = s.trim().split_once(':').ok_or(bad.clone())?;
        match kind {
            "button" => rest
                .parse::<u8>()
                .map(GamepadCode::Button)
                .map_err(|_| bad),
            "hat" => {
                let (x, y) = rest.split_once(',').ok_or(bad.clone())?;
                let x = x.trim().parse::<i8>().map_err(|_| bad.clone())?;
                let y = y.trim().parse::<i8>().map_err(|_| bad.clone())?;
                let code = GamepadCode::Hat { x, y };
                code.validate()?;
                Ok(code)
            }
            _ => Err(bad),
        }
    }
}

impl Validate for GamepadCode {
    fn validate(&self) -> Result<(), ContractViolation> {
        if let GamepadCode::Hat { x, y } = self {
            if !(-1..=1).contains(x) || !(-1..=1).contains(y) {
                return Err(ContractViolation::InvalidValue {
                    field: "gamepad_code.hat",
                    reason: "axes must be in -1..=1",
                });
            }
            if *x == 0 && *y == 0 {
                return Err(ContractViolation::InvalidValue {
                    field: "gamepad_code.hat",
                    reason: "centered hat is not a response",
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for GamepadCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GamepadCode::Button(b) => write!(f, "button:{b}"),
            GamepadCode::Hat { x, y } => write!(f, "hat:{x},{y}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum InputCode {
    Key(KeyName),
    Gamepad(GamepadCode),
}

/// A raw input event stamped with the monotonic time it was observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputEvent {
    pub code: InputCode,
    pub at: MonotonicTimeNs,
}

impl InputEvent {
    pub fn key(name: &str, at: MonotonicTimeNs) -> Result<Self, ContractViolation> {
        Ok(Self {
            code: InputCode::Key(KeyName::new(name)?),
            at,
        })
    }

    pub fn gamepad(code: GamepadCode, at: MonotonicTimeNs) -> Self {
        Self {
            code: InputCode::Gamepad(code),
            at,
        }
    }
}

fn validate_map_not_empty<K>(
    field: &'static str,
    map: &BTreeMap<K, LogicalResponse>,
) -> Result<(), ContractViolation> {
    if map.is_empty() {
        return Err(ContractViolation::InvalidValue {
            field,
            reason: "must map at least one input",
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, u8>")]
pub struct KeyboardMap(BTreeMap<KeyName, LogicalResponse>);

impl KeyboardMap {
    pub fn new(entries: BTreeMap<KeyName, LogicalResponse>) -> Result<Self, ContractViolation> {
        let m = Self(entries);
        m.validate()?;
        Ok(m)
    }

    pub fn lookup(&self, key: &KeyName) -> Option<LogicalResponse> {
        self.0.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for KeyboardMap {
    fn default() -> Self {
        let mut m = BTreeMap::new();
        m.insert(KeyName("y".to_string()), LogicalResponse::YES);
        m.insert(KeyName("n".to_string()), LogicalResponse::NO);
        Self(m)
    }
}

impl TryFrom<BTreeMap<String, u8>> for KeyboardMap {
    type Error = ContractViolation;

    fn try_from(raw: BTreeMap<String, u8>) -> Result<Self, Self::Error> {
        let mut m = BTreeMap::new();
        for (k, v) in raw {
            m.insert(KeyName::new(k)?, LogicalResponse::new(v)?);
        }
        Self::new(m)
    }
}

impl Validate for KeyboardMap {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_map_not_empty("keyboard_map", &self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "BTreeMap<String, u8>")]
pub struct GamepadMap(BTreeMap<GamepadCode, LogicalResponse>);

impl GamepadMap {
    pub fn new(entries: BTreeMap<GamepadCode, LogicalResponse>) -> Result<Self, ContractViolation> {
        let m = Self(entries);
        m.validate()?;
        Ok(m)
    }

    pub fn lookup(&self, code: GamepadCode) -> Option<LogicalResponse> {
        self.0.get(&code).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for GamepadMap {
    fn default() -> Self {
        let mut m = BTreeMap::new();
        m.insert(GamepadCode::Button(0), LogicalResponse::YES);
        m.insert(GamepadCode::Button(1), LogicalResponse::NO);
        Self(m)
    }
}

impl TryFrom<BTreeMap<String, u8>> for GamepadMap {
    type Error = ContractViolation;

    fn try_from(raw: BTreeMap<String, u8>) -> Result<Self, Self::Error> {
        let mut m = BTreeMap::new();
        for (k, v) in raw {
            let code: GamepadCode = k.parse()?;
            m.insert(code, LogicalResponse::new(v)?);
        }
        Self::new(m)
    }
}

impl Validate for GamepadMap {
    fn validate(&self) -> Result<(), ContractViolation> {
        validate_map_not_empty("gamepad_map", &self.0)?;
        for code in self.0.keys() {
            code.validate()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_device_01_key_names_are_normalised() {
        assert_eq!(KeyName::new(" Y ").unwrap().as_str(), "y");
        assert!(KeyName::new("").is_err());
        assert!(KeyName::new("left shift").is_err());
    }

    #[test]
    fn at_device_02_gamepad_codes_parse_buttons_and_hats() {
        assert_eq!("button:3".parse::<GamepadCode>().unwrap(), GamepadCode::Button(3));
        assert_eq!(
            "hat:-1,0".parse::<GamepadCode>().unwrap(),
            GamepadCode::Hat { x: -1, y: 0 }
        );
        assert!("hat:0,0".parse::<GamepadCode>().is_err());
        assert!("hat:2,0".parse::<GamepadCode>().is_err());
        assert!("axis:1".parse::<GamepadCode>().is_err());
    }

    #[test]
    fn at_device_03_maps_deserialize_from_json_objects() {
        let kb: KeyboardMap = serde_json::from_str(r#"{"y": 1, "n": 0}"#).unwrap();
        assert_eq!(kb, KeyboardMap::default());

        let gp: GamepadMap =
            serde_json::from_str(r#"{"button:0": 1, "hat:1,0": 0}"#).unwrap();
        assert_eq!(gp.lookup(GamepadCode::Button(0)), Some(LogicalResponse::YES));
        assert_eq!(
            gp.lookup(GamepadCode::Hat { x: 1, y: 0 }),
            Some(LogicalResponse::NO)
        );
        assert_eq!(gp.lookup(GamepadCode::Button(7)), None);
    }

    #[test]
    fn at_device_04_maps_reject_non_binary_values_and_empty_maps() {
        assert!(serde_json::from_str::<KeyboardMap>(r#"{"y": 2}"#).is_err());
        assert!(serde_json::from_str::<KeyboardMap>(r#"{}"#).is_err());
        assert!(serde_json::from_str::<GamepadMap>(r#"{"trigger": 1}"#).is_err());
    }
}
