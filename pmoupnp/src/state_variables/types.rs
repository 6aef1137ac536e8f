use std::fmt;
use std::str::FromStr;

use super::StateVariableError;

/// Types de données UPnP des variables d'état.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateVarType {
    UI1,        // Unsigned 8-bit integer
    UI2,        // Unsigned 16-bit integer
    UI4,        // Unsigned 32-bit integer
    I1,         // Signed 8-bit integer
    I2,         // Signed 16-bit integer
    I4,         // Signed 32-bit integer
    Int,        // Synonymous with i4
    R4,         // 32-bit floating point
    R8,         // 64-bit floating point
    Number,     // Synonymous with r8
    Fixed14_4,  // Fixed-point decimal
    Float,      // Floating point
    Char,       // Single Unicode character
    String,     // Character string
    Boolean,    // Boolean value
    BinBase64,  // Base64-encoded binary
    BinHex,     // Hex-encoded binary
    Date,       // Date (YYYY-MM-DD)
    DateTime,   // DateTime without timezone
    DateTimeTZ, // DateTime with timezone
    Time,       // Time without timezone
    TimeTZ,     // Time with timezone
    UUID,       // Universally unique identifier
    URI,        // Uniform Resource Identifier
}

/// Valeur portée par une [`StateVar`](super::StateVar).
///
/// Les types UPnP « chaîne » (dates, URI, binaires encodés...) sont
/// transportés sous leur forme textuelle.
#[derive(Debug, Clone, PartialEq)]
pub enum StateValue {
    Integer(i64),
    Float(f64),
    Boolean(bool),
    String(String),
}

impl StateVarType {
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            StateVarType::UI1
                | StateVarType::UI2
                | StateVarType::UI4
                | StateVarType::I1
                | StateVarType::I2
                | StateVarType::I4
                | StateVarType::Int
        )
    }

    pub fn is_float(&self) -> bool {
        matches!(
            self,
            StateVarType::R4
                | StateVarType::R8
                | StateVarType::Number
                | StateVarType::Fixed14_4
                | StateVarType::Float
        )
    }

    pub fn is_numeric(&self) -> bool {
        self.is_integer() || self.is_float()
    }

    /// Valeur initiale d'une variable sans valeur explicite : 0 pour les types
    /// numériques, `false` pour les booléens, chaîne vide sinon.
    pub fn default_value(&self) -> StateValue {
        if self.is_integer() {
            StateValue::Integer(0)
        } else if self.is_float() {
            StateValue::Float(0.0)
        } else if *self == StateVarType::Boolean {
            StateValue::Boolean(false)
        } else {
            StateValue::String(String::new())
        }
    }

    /// Vérifie qu'une valeur est compatible avec le type et la normalise
    /// (un entier affecté à un type flottant devient un flottant).
    ///
    /// Rend `None` si la valeur n'est pas du bon genre.
    pub fn coerce(&self, value: StateValue) -> Option<StateValue> {
        match value {
            StateValue::Integer(i) if self.is_integer() => Some(StateValue::Integer(i)),
            StateValue::Integer(i) if self.is_float() => Some(StateValue::Float(i as f64)),
            StateValue::Float(f) if self.is_float() => Some(StateValue::Float(f)),
            StateValue::Boolean(b) if *self == StateVarType::Boolean => Some(StateValue::Boolean(b)),
            StateValue::String(s) if !self.is_numeric() && *self != StateVarType::Boolean => {
                Some(StateValue::String(s))
            }
            _ => None,
        }
    }
}

impl fmt::Display for StateVarType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let s = match self {
            StateVarType::UI1 => "ui1",
            StateVarType::UI2 => "ui2",
            StateVarType::UI4 => "ui4",
            StateVarType::I1 => "i1",
            StateVarType::I2 => "i2",
            StateVarType::I4 => "i4",
            StateVarType::Int => "int",
            StateVarType::R4 => "r4",
            StateVarType::R8 => "r8",
            StateVarType::Number => "number",
            StateVarType::Fixed14_4 => "fixed.14.4",
            StateVarType::Float => "float",
            StateVarType::Char => "char",
            StateVarType::String => "string",
            StateVarType::Boolean => "boolean",
            StateVarType::BinBase64 => "bin.base64",
            StateVarType::BinHex => "bin.hex",
            StateVarType::Date => "date",
            StateVarType::DateTime => "dateTime",
            StateVarType::DateTimeTZ => "dateTime.tz",
            StateVarType::Time => "time",
            StateVarType::TimeTZ => "time.tz",
            StateVarType::UUID => "uuid",
            StateVarType::URI => "uri",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for StateVarType {
    type Err = StateVariableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ui1" => Ok(StateVarType::UI1),
            "ui2" => Ok(StateVarType::UI2),
            "ui4" => Ok(StateVarType::UI4),
            "i1" => Ok(StateVarType::I1),
            "i2" => Ok(StateVarType::I2),
            "i4" => Ok(StateVarType::I4),
            "int" => Ok(StateVarType::Int),
            "r4" => Ok(StateVarType::R4),
            "r8" => Ok(StateVarType::R8),
            "number" => Ok(StateVarType::Number),
            "fixed.14.4" => Ok(StateVarType::Fixed14_4),
            "float" => Ok(StateVarType::Float),
            "char" => Ok(StateVarType::Char),
            "string" => Ok(StateVarType::String),
            "boolean" => Ok(StateVarType::Boolean),
            "bin.base64" => Ok(StateVarType::BinBase64),
            "bin.hex" => Ok(StateVarType::BinHex),
            "date" => Ok(StateVarType::Date),
            "datetime" => Ok(StateVarType::DateTime),
            "datetime.tz" => Ok(StateVarType::DateTimeTZ),
            "time" => Ok(StateVarType::Time),
            "time.tz" => Ok(StateVarType::TimeTZ),
            "uuid" => Ok(StateVarType::UUID),
            "uri" => Ok(StateVarType::URI),
            _ => Err(StateVariableError::UnknownType(s.to_string())),
        }
    }
}

impl StateValue {
    /// Nom court du genre de valeur, pour les messages d'erreur.
    pub fn kind(&self) -> &'static str {
        match self {
            StateValue::Integer(_) => "integer",
            StateValue::Float(_) => "float",
            StateValue::Boolean(_) => "boolean",
            StateValue::String(_) => "string",
        }
    }
}

/// Représentation textuelle UPnP (booléens en `1`/`0`).
impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StateValue::Integer(i) => write!(f, "{}", i),
            StateValue::Float(v) => write!(f, "{}", v),
            StateValue::Boolean(b) => write!(f, "{}", if *b { "1" } else { "0" }),
            StateValue::String(s) => write!(f, "{}", s),
        }
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for StateValue {
                fn from(v: $t) -> Self {
                    StateValue::Integer(v as i64)
                }
            }
        )*
    };
}

impl_from_integer!(u8, u16, u32, i8, i16, i32, i64);

impl From<f32> for StateValue {
    fn from(v: f32) -> Self {
        StateValue::Float(v as f64)
    }
}

impl From<f64> for StateValue {
    fn from(v: f64) -> Self {
        StateValue::Float(v)
    }
}

impl From<bool> for StateValue {
    fn from(v: bool) -> Self {
        StateValue::Boolean(v)
    }
}

impl From<&str> for StateValue {
    fn from(v: &str) -> Self {
        StateValue::String(v.to_string())
    }
}

impl From<String> for StateValue {
    fn from(v: String) -> Self {
        StateValue::String(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        assert_eq!(StateVarType::UI4.default_value(), StateValue::Integer(0));
        assert_eq!(StateVarType::R8.default_value(), StateValue::Float(0.0));
        assert_eq!(StateVarType::Boolean.default_value(), StateValue::Boolean(false));
        assert_eq!(StateVarType::URI.default_value(), StateValue::String(String::new()));
        assert_eq!(StateVarType::DateTime.default_value(), StateValue::String(String::new()));
    }

    #[test]
    fn test_coerce() {
        assert_eq!(StateVarType::R4.coerce(3.into()), Some(StateValue::Float(3.0)));
        assert_eq!(StateVarType::UI4.coerce(StateValue::Float(1.5)), None);
        assert_eq!(StateVarType::String.coerce(true.into()), None);
        assert_eq!(StateVarType::Boolean.coerce("1".into()), None);
        assert_eq!(
            StateVarType::UUID.coerce("abc".into()),
            Some(StateValue::String("abc".to_string()))
        );
    }

    #[test]
    fn test_type_names_round_trip() {
        for name in ["ui4", "dateTime.tz", "fixed.14.4", "bin.base64", "uri"] {
            let t: StateVarType = name.parse().unwrap();
            assert_eq!(t.to_string(), name);
        }
        assert!("complex".parse::<StateVarType>().is_err());
    }

    #[test]
    fn test_value_display() {
        assert_eq!(StateValue::Boolean(true).to_string(), "1");
        assert_eq!(StateValue::Integer(-4).to_string(), "-4");
    }
}
