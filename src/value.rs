use crate::statics;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, de};
use std::borrow::Cow;

/// A number that keeps the integer/float distinction of the source document.
/// Integers display without a fractional part, the way the host shows them.
#[derive(Debug, Clone, PartialEq)]
pub enum Number {
    I64(i64),
    U64(u64),
    F64(f64),
}

impl Number {
    fn write_display(&self, out: &mut String) {
        match self {
            Number::I64(v) => out.push_str(&v.to_string()),
            Number::U64(v) => out.push_str(&v.to_string()),
            Number::F64(v) => write_float(*v, out),
        }
    }
}

/// Writes `v` the way the host stringifies numbers: positional notation for decimal
/// exponents in `-7..21`, exponent notation (`1e+21`, `1.5e-7`) outside it.
fn write_float(v: f64, out: &mut String) {
    if v.is_nan() {
        out.push_str("NaN");
        return;
    }
    if v.is_infinite() {
        out.push_str(if v.is_sign_negative() { "-Infinity" } else { "Infinity" });
        return;
    }
    if v == 0.0 {
        out.push('0');
        return;
    }
    if v.is_sign_negative() {
        out.push('-');
    }

    // ryu yields the shortest round-tripping digits; only the layout is redone here.
    let mut buf = ryu::Buffer::new();
    let shortest = buf.format_finite(v.abs());
    let (mantissa, exp) = match shortest.split_once('e') {
        Some((m, e)) => (m, e.parse::<i32>().unwrap_or(0)),
        None => (shortest, 0),
    };
    let (int_part, frac_part) = mantissa.split_once('.').unwrap_or((mantissa, ""));

    // value = 0.DIGITS * 10^point
    let mut digits: String = format!("{int_part}{frac_part}");
    let mut point = int_part.len() as i32 + exp;
    let leading = digits.len() - digits.trim_start_matches('0').len();
    digits.drain(..leading);
    point -= leading as i32;
    digits.truncate(digits.trim_end_matches('0').len());

    let k = digits.len() as i32;
    if k <= point && point <= 21 {
        out.push_str(&digits);
        out.extend(std::iter::repeat_n('0', (point - k) as usize));
    } else if 0 < point && point <= 21 {
        let (whole, frac) = digits.split_at(point as usize);
        out.push_str(whole);
        out.push('.');
        out.push_str(frac);
    } else if -6 < point && point <= 0 {
        out.push_str("0.");
        out.extend(std::iter::repeat_n('0', (-point) as usize));
        out.push_str(&digits);
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        let e = point - 1;
        out.push('e');
        out.push(if e < 0 { '-' } else { '+' });
        out.push_str(&e.abs().to_string());
    }
}

/// A node of the data being browsed. Objects keep insertion order, but nothing downstream
/// relies on it: candidate lists are always re-sorted.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum DataValue {
    /// A member that exists but holds no value (distinct from `Null`).
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<DataValue>),
    Object(IndexMap<String, DataValue>),
}

impl DataValue {
    pub fn as_object(&self) -> Option<&IndexMap<String, DataValue>> {
        match self {
            DataValue::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&DataValue> {
        self.as_object().and_then(|m| m.get(key))
    }

    /// Looks up one path segment: a member name for objects, a decimal index for arrays.
    pub fn child(&self, segment: &str) -> Option<&DataValue> {
        match self {
            DataValue::Object(map) => map.get(segment),
            DataValue::Array(values) => segment.parse::<usize>().ok().and_then(|i| values.get(i)),
            _ => None,
        }
    }

    /// Direct children as `(segment, value)` pairs. Primitives have none.
    pub fn children(&self) -> Vec<(Cow<'_, str>, &DataValue)> {
        match self {
            DataValue::Object(map) => map
                .iter()
                .map(|(k, v)| (Cow::Borrowed(k.as_str()), v))
                .collect(),
            DataValue::Array(values) => values
                .iter()
                .enumerate()
                .map(|(i, v)| (Cow::Owned(i.to_string()), v))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// True for values that can be descended into: non-null objects and arrays.
    pub fn has_children(&self) -> bool {
        matches!(self, DataValue::Object(_) | DataValue::Array(_))
    }

    /// Whether the value sorts in the object group of a candidate list.
    /// `Null` belongs there too, as the host's `typeof null` is "object".
    pub fn sorts_as_object(&self) -> bool {
        matches!(
            self,
            DataValue::Null | DataValue::Object(_) | DataValue::Array(_)
        )
    }

    pub fn parse_json5(text: &str) -> anyhow::Result<DataValue> {
        Ok(json5::from_str::<DataValue>(text)?)
    }
}

/// Display form of a candidate value. Structure is never expanded: any object or array
/// renders as a `{}` placeholder.
pub fn format_value(value: &DataValue) -> String {
    match value {
        DataValue::Undefined => statics::LITERAL_UNDEFINED.to_string(),
        DataValue::Null => statics::LITERAL_NULL.to_string(),
        DataValue::Bool(v) => v.to_string(),
        DataValue::Number(n) => {
            let mut out = String::new();
            n.write_display(&mut out);
            out
        }
        DataValue::String(s) => format!("\"{s}\""),
        DataValue::Array(_) | DataValue::Object(_) => statics::LITERAL_OBJECT.to_string(),
    }
}

impl<'de> Deserialize<'de> for DataValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ValueVisitor;

        impl<'de> de::Visitor<'de> for ValueVisitor {
            type Value = DataValue;

            fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
                f.write_str("a JSON5 value")
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(DataValue::Null)
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(DataValue::Null)
            }

            fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
                Ok(DataValue::Bool(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(DataValue::Number(Number::I64(v)))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(DataValue::Number(Number::U64(v)))
            }

            fn visit_i128<E: de::Error>(self, v: i128) -> Result<Self::Value, E> {
                Ok(DataValue::Number(match i64::try_from(v) {
                    Ok(v) => Number::I64(v),
                    Err(_) => Number::F64(v as f64),
                }))
            }

            fn visit_u128<E: de::Error>(self, v: u128) -> Result<Self::Value, E> {
                Ok(DataValue::Number(match u64::try_from(v) {
                    Ok(v) => Number::U64(v),
                    Err(_) => Number::F64(v as f64),
                }))
            }

            fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
                Ok(DataValue::Number(Number::F64(v)))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(DataValue::String(v.to_owned()))
            }

            fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
                Ok(DataValue::String(v))
            }

            fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
                let mut values = Vec::new();
                while let Some(value) = seq.next_element::<DataValue>()? {
                    values.push(value);
                }
                Ok(DataValue::Array(values))
            }

            fn visit_map<A: de::MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut values = IndexMap::new();
                while let Some((key, value)) = map.next_entry::<String, DataValue>()? {
                    values.insert(key, value);
                }
                Ok(DataValue::Object(values))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
