use crate::constant_pool::{ConstantPool, CpInfo};
use crate::error::{Error, Result};
use crate::reader::Reader;

/// A `RuntimeVisibleAnnotations`/`RuntimeInvisibleAnnotations` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Field descriptor of the annotation type, e.g. `Lcom/example/Marker;`.
    pub type_descriptor: String,
    pub elements: Vec<AnnotationElement>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationElement {
    pub name: String,
    pub value: ElementValue,
}

impl Annotation {
    /// Internal binary name of the annotation type, if the descriptor has
    /// object form.
    pub fn type_internal_name(&self) -> Option<&str> {
        self.type_descriptor
            .strip_prefix('L')
            .and_then(|rest| rest.strip_suffix(';'))
    }

    pub(crate) fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let type_descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
        let num_elements = reader.read_u2()? as usize;
        let mut elements = Vec::with_capacity(num_elements);
        for _ in 0..num_elements {
            let name = cp.get_utf8(reader.read_u2()?)?.to_string();
            let value = ElementValue::parse(reader, cp)?;
            elements.push(AnnotationElement { name, value });
        }
        Ok(Self { type_descriptor, elements })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Const(ConstValue),
    Enum { type_descriptor: String, const_name: String },
    Class(String),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Byte(i8),
    Char(char),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    String(String),
}

impl ElementValue {
    fn parse(reader: &mut Reader<'_>, cp: &ConstantPool) -> Result<Self> {
        let tag = reader.read_u1()? as char;
        match tag {
            'B' | 'C' | 'I' | 'S' | 'Z' => {
                let value = expect_integer(reader.read_u2()?, cp)?;
                let cv = match tag {
                    'B' => ConstValue::Byte(value as i8),
                    'C' => ConstValue::Char(
                        char::from_u32(value as u32)
                            .ok_or(Error::MalformedAttribute("annotation element value"))?,
                    ),
                    'S' => ConstValue::Short(value as i16),
                    'Z' => ConstValue::Boolean(value != 0),
                    _ => ConstValue::Int(value),
                };
                Ok(ElementValue::Const(cv))
            }
            'J' => {
                let idx = reader.read_u2()?;
                match cp.get(idx)? {
                    CpInfo::Long(v) => Ok(ElementValue::Const(ConstValue::Long(*v))),
                    other => Err(mismatch(idx, "Long", other)),
                }
            }
            'F' => {
                let idx = reader.read_u2()?;
                match cp.get(idx)? {
                    CpInfo::Float(v) => Ok(ElementValue::Const(ConstValue::Float(*v))),
                    other => Err(mismatch(idx, "Float", other)),
                }
            }
            'D' => {
                let idx = reader.read_u2()?;
                match cp.get(idx)? {
                    CpInfo::Double(v) => Ok(ElementValue::Const(ConstValue::Double(*v))),
                    other => Err(mismatch(idx, "Double", other)),
                }
            }
            's' => {
                let value = cp.get_utf8(reader.read_u2()?)?.to_string();
                Ok(ElementValue::Const(ConstValue::String(value)))
            }
            'e' => {
                let type_descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
                let const_name = cp.get_utf8(reader.read_u2()?)?.to_string();
                Ok(ElementValue::Enum { type_descriptor, const_name })
            }
            'c' => Ok(ElementValue::Class(cp.get_utf8(reader.read_u2()?)?.to_string())),
            '@' => Ok(ElementValue::Annotation(Box::new(Annotation::parse(reader, cp)?))),
            '[' => {
                let num_values = reader.read_u2()? as usize;
                let mut values = Vec::with_capacity(num_values);
                for _ in 0..num_values {
                    values.push(ElementValue::parse(reader, cp)?);
                }
                Ok(ElementValue::Array(values))
            }
            _ => Err(Error::MalformedAttribute("annotation element value")),
        }
    }
}

fn expect_integer(idx: u16, cp: &ConstantPool) -> Result<i32> {
    match cp.get(idx)? {
        CpInfo::Integer(v) => Ok(*v),
        other => Err(mismatch(idx, "Integer", other)),
    }
}

fn mismatch(index: u16, expected: &'static str, found: &CpInfo) -> Error {
    Error::ConstantPoolTypeMismatch { index, expected, found: found.kind() }
}
