use std::collections::hash_map::IntoIter;
use std::collections::HashMap;
use std::env;
use std::ops::Deref;
use std::str::FromStr;

use lazy_static::lazy_static;
use serde_json::{Number, Value};

use crate::core::Error;

static CONFIGURATION_SPECIFICATION: &str = include_str!("../../../../../resources/specification/configuration.json");

lazy_static! {
    static ref IS_ARGUMENT: regex::Regex = regex::Regex::new(r"^--[^=]+=.+$").expect("invalid regex");
}

lazy_static! {
    static ref IS_STRING: regex::Regex = regex::Regex::new(r"^'[^']*'$").expect("invalid regex");
    static ref IS_NUMBER: regex::Regex = regex::Regex::new(r"^[0-9]+(\.[0-9]+)?$").expect("invalid regex");
    static ref IS_EMPTY_ARRAY: regex::Regex = regex::Regex::new(r"^\[\]$").expect("invalid regex");
    static ref IS_ARRAY: regex::Regex = regex::Regex::new(r"^\[.*\]$").expect("invalid regex");
}

/// Location of a value in the configuration tree
#[derive(PartialEq, Eq, Hash, Clone, Debug)]
pub struct JSONPath(Vec<String>);

impl Deref for JSONPath {
    type Target = [String];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl JSONPath {
    pub fn from_str(s: &str) -> Self {
        JSONPath(s.split(".").map(|x| x.to_lowercase().to_string()).collect())
    }
}

/// Maps flat variable names such as `owners_donor_private_key` onto the configuration tree. The names are
/// derived from the leaves of the configuration specification, nested keys being joined by `_`.
#[derive(Debug)]
pub struct VariablesResolver(HashMap<String, JSONPath>);

impl VariablesResolver {
    pub fn initialize() -> Result<Self, Error> {
        fn resolve_variables(path: &[String], value: Value) -> HashMap<String, JSONPath> {
            let mut variables = HashMap::new();
            match value {
                Value::Object(fields) => {
                    for (field, value) in fields {
                        variables.extend(resolve_variables(&[path, &[field]].concat(), value))
                    }
                },
                _ => {
                    variables.insert(path.join("_"), JSONPath(path.to_vec()));
                },
            }

            variables
        }

        let specification: Value = serde_json::from_str(CONFIGURATION_SPECIFICATION).map_err(|e| Error::Configuration(e.to_string()))?;

        let mut resolutions = HashMap::new();
        resolutions.insert("profile".to_string(), JSONPath::from_str("profile"));
        resolutions.extend(resolve_variables(&[], specification));

        Ok(Self(resolutions))
    }

    pub fn resolve_environment(&self) -> Result<Variables, Error> {
        let variables = envy::prefixed("GASLESS_")
            .from_env::<HashMap<String, String>>()
            .map_err(|e| Error::Configuration(e.to_string()))?;

        self.resolve_variables(variables)
    }

    pub fn resolve_arguments(&self) -> Result<Variables, Error> {
        let mut arguments = HashMap::new();
        for raw_argument in env::args().skip(1) {
            if !IS_ARGUMENT.is_match(&raw_argument) {
                return Err(Error::Configuration(format!("invalid argument {}, must be of the form '--xxx=yyy'", raw_argument)));
            }

            let Some((raw_name, raw_value)) = raw_argument.split_once("=") else { continue };

            let name = raw_name.trim().replace("--", "");
            arguments.insert(name, raw_value.to_string());
        }

        self.resolve_variables(arguments)
    }

    fn resolve_variables(&self, variables: HashMap<String, String>) -> Result<Variables, Error> {
        let mut resolved_variables = HashMap::new();
        for (name, value) in variables {
            if let Some(path) = self.0.get(&name.to_lowercase()) {
                resolved_variables.insert(path.clone(), Self::decode_value(&value)?);
            }
        }

        Ok(Variables(resolved_variables))
    }

    fn decode_value(value: &str) -> Result<Value, Error> {
        Ok(match value {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),

            value if IS_STRING.is_match(value) => Value::String(value[1..value.len() - 1].to_string()),
            value if IS_NUMBER.is_match(value) => Number::from_str(value)
                .map(Value::Number)
                .map_err(|e| Error::Configuration(e.to_string()))?,
            value if IS_EMPTY_ARRAY.is_match(value) => Value::Array(vec![]),
            value if IS_ARRAY.is_match(value) => {
                let mut elements = vec![];
                for value in value[1..value.len() - 1].split(",") {
                    elements.push(Self::decode_value(value)?)
                }

                Value::Array(elements)
            },

            value => Value::String(value.to_string()),
        })
    }
}

pub struct Variables(HashMap<JSONPath, Value>);

impl Variables {
    pub fn get(&self, s: &str) -> Option<&Value> {
        self.0.get(&JSONPath::from_str(s))
    }

    pub fn into_iter(self) -> IntoIter<JSONPath, Value> {
        self.0.into_iter()
    }
}
