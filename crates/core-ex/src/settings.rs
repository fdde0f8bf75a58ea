//! `:set` settings registry (§4.J, SPEC_FULL §13): 27 named options with
//! bool/int/str values and short-name aliases.

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl std::fmt::Display for SettingValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettingValue::Bool(b) => write!(f, "{b}"),
            SettingValue::Int(i) => write!(f, "{i}"),
            SettingValue::Str(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingType {
    Bool,
    Int,
    Str,
}

struct Spec {
    name: &'static str,
    alias: &'static str,
    ty: SettingType,
    default: fn() -> SettingValue,
}

macro_rules! bool_spec {
    ($name:expr, $alias:expr, $default:expr) => {
        Spec { name: $name, alias: $alias, ty: SettingType::Bool, default: || SettingValue::Bool($default) }
    };
}
macro_rules! int_spec {
    ($name:expr, $alias:expr, $default:expr) => {
        Spec { name: $name, alias: $alias, ty: SettingType::Int, default: || SettingValue::Int($default) }
    };
}
macro_rules! str_spec {
    ($name:expr, $alias:expr, $default:expr) => {
        Spec { name: $name, alias: $alias, ty: SettingType::Str, default: || SettingValue::Str($default.to_string()) }
    };
}

fn specs() -> Vec<Spec> {
    vec![
        bool_spec!("number", "nu", false),
        bool_spec!("relativenumber", "rnu", false),
        bool_spec!("ignorecase", "ic", false),
        bool_spec!("smartcase", "scs", false),
        bool_spec!("hlsearch", "hls", false),
        bool_spec!("incsearch", "is", false),
        bool_spec!("wrapscan", "ws", true),
        int_spec!("tabstop", "ts", 8),
        int_spec!("softtabstop", "sts", 0),
        int_spec!("shiftwidth", "sw", 8),
        bool_spec!("expandtab", "et", false),
        bool_spec!("autoindent", "ai", false),
        bool_spec!("smartindent", "si", false),
        bool_spec!("wrap", "wrap", true),
        bool_spec!("list", "list", false),
        bool_spec!("ruler", "ru", true),
        bool_spec!("showcmd", "sc", true),
        bool_spec!("showmode", "smd", true),
        bool_spec!("backup", "bk", false),
        bool_spec!("writebackup", "wb", true),
        bool_spec!("swapfile", "swf", true),
        bool_spec!("autowrite", "aw", false),
        bool_spec!("autoread", "ar", false),
        str_spec!("backspace", "bs", ""),
        int_spec!("scrolloff", "so", 0),
        int_spec!("sidescrolloff", "siso", 0),
        int_spec!("history", "hi", 50),
        int_spec!("report", "report", 2),
        int_spec!("laststatus", "ls", 1),
    ]
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    UnknownOption(String),
    TypeMismatch { option: String, expected: SettingType },
}

pub struct SettingsRegistry {
    specs: Vec<Spec>,
    values: HashMap<&'static str, SettingValue>,
}

impl SettingsRegistry {
    pub fn new() -> Self {
        let specs = specs();
        let values = specs.iter().map(|s| (s.name, (s.default)())).collect();
        Self { specs, values }
    }

    fn resolve_name(&self, raw: &str) -> Option<&'static str> {
        self.specs
            .iter()
            .find(|s| s.name == raw || s.alias == raw)
            .map(|s| s.name)
    }

    fn spec(&self, canonical: &str) -> &Spec {
        self.specs.iter().find(|s| s.name == canonical).expect("canonical name always resolves")
    }

    pub fn get(&self, raw: &str) -> Result<&SettingValue, SettingsError> {
        let canon = self.resolve_name(raw).ok_or_else(|| SettingsError::UnknownOption(raw.to_string()))?;
        Ok(self.values.get(canon).expect("default always populated"))
    }

    pub fn set_bool(&mut self, raw: &str, value: bool) -> Result<(), SettingsError> {
        let canon = self.resolve_name(raw).ok_or_else(|| SettingsError::UnknownOption(raw.to_string()))?;
        if self.spec(canon).ty != SettingType::Bool {
            return Err(SettingsError::TypeMismatch { option: canon.to_string(), expected: self.spec(canon).ty });
        }
        self.values.insert(canon, SettingValue::Bool(value));
        Ok(())
    }

    pub fn toggle_bool(&mut self, raw: &str) -> Result<bool, SettingsError> {
        let current = match self.get(raw)? {
            SettingValue::Bool(b) => *b,
            _ => return Err(SettingsError::TypeMismatch { option: raw.to_string(), expected: SettingType::Bool }),
        };
        self.set_bool(raw, !current)?;
        Ok(!current)
    }

    pub fn set_int(&mut self, raw: &str, value: i64) -> Result<(), SettingsError> {
        let canon = self.resolve_name(raw).ok_or_else(|| SettingsError::UnknownOption(raw.to_string()))?;
        if self.spec(canon).ty != SettingType::Int {
            return Err(SettingsError::TypeMismatch { option: canon.to_string(), expected: self.spec(canon).ty });
        }
        self.values.insert(canon, SettingValue::Int(value));
        Ok(())
    }

    pub fn set_str(&mut self, raw: &str, value: String) -> Result<(), SettingsError> {
        let canon = self.resolve_name(raw).ok_or_else(|| SettingsError::UnknownOption(raw.to_string()))?;
        if self.spec(canon).ty != SettingType::Str {
            return Err(SettingsError::TypeMismatch { option: canon.to_string(), expected: self.spec(canon).ty });
        }
        self.values.insert(canon, SettingValue::Str(value));
        Ok(())
    }

    /// Apply a raw override from the startup config, ignoring type mismatch
    /// loudly by returning the error to the caller for logging.
    pub fn apply_raw(&mut self, raw: &str, value: SettingValue) -> Result<(), SettingsError> {
        match value {
            SettingValue::Bool(b) => self.set_bool(raw, b),
            SettingValue::Int(i) => self.set_int(raw, i),
            SettingValue::Str(s) => self.set_str(raw, s),
        }
    }

    /// Options whose value differs from its declared default, in canonical
    /// name order, for `:set` with no arguments.
    pub fn list_non_default(&self) -> Vec<(&'static str, &SettingValue)> {
        let mut out: Vec<_> = self
            .specs
            .iter()
            .filter_map(|s| {
                let current = self.values.get(s.name)?;
                if *current != (s.default)() {
                    Some((s.name, current))
                } else {
                    None
                }
            })
            .collect();
        out.sort_by_key(|(n, _)| *n);
        out
    }
}

impl Default for SettingsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alias_resolves_to_canonical() {
        let mut reg = SettingsRegistry::new();
        reg.set_int("ts", 4).unwrap();
        assert_eq!(reg.get("tabstop").unwrap(), &SettingValue::Int(4));
    }

    #[test]
    fn unknown_option_rejected() {
        let reg = SettingsRegistry::new();
        assert_eq!(reg.get("bogus"), Err(SettingsError::UnknownOption("bogus".into())));
    }

    #[test]
    fn toggle_flips_bool() {
        let mut reg = SettingsRegistry::new();
        assert_eq!(reg.toggle_bool("nu").unwrap(), true);
        assert_eq!(reg.toggle_bool("number").unwrap(), false);
    }

    #[test]
    fn list_non_default_only_includes_changed() {
        let mut reg = SettingsRegistry::new();
        assert!(reg.list_non_default().is_empty());
        reg.set_bool("ic", true).unwrap();
        let listed = reg.list_non_default();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].0, "ignorecase");
    }

    #[test]
    fn type_mismatch_rejected() {
        let mut reg = SettingsRegistry::new();
        assert!(matches!(reg.set_int("nu", 1), Err(SettingsError::TypeMismatch { .. })));
    }
}
