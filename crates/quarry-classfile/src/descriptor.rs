use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    Byte,
    Char,
    Double,
    Float,
    Int,
    Long,
    Short,
    Boolean,
}

impl BaseType {
    pub fn name(self) -> &'static str {
        match self {
            BaseType::Byte => "byte",
            BaseType::Char => "char",
            BaseType::Double => "double",
            BaseType::Float => "float",
            BaseType::Int => "int",
            BaseType::Long => "long",
            BaseType::Short => "short",
            BaseType::Boolean => "boolean",
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        Some(match tag {
            b'B' => BaseType::Byte,
            b'C' => BaseType::Char,
            b'D' => BaseType::Double,
            b'F' => BaseType::Float,
            b'I' => BaseType::Int,
            b'J' => BaseType::Long,
            b'S' => BaseType::Short,
            b'Z' => BaseType::Boolean,
            _ => return None,
        })
    }
}

/// The erased type of a field, parameter or return value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    Base(BaseType),
    Object(String),
    Array(Box<FieldType>),
}

impl FieldType {
    /// Array dimensionality and the non-array element type underneath.
    pub fn peel_array(&self) -> (usize, &FieldType) {
        let mut dimensions = 0;
        let mut current = self;
        while let FieldType::Array(component) = current {
            dimensions += 1;
            current = component;
        }
        (dimensions, current)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReturnType {
    Void,
    Type(FieldType),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    pub params: Vec<FieldType>,
    pub return_type: ReturnType,
}

pub fn parse_field_descriptor(desc: &str) -> Result<FieldType> {
    let (ty, rest) = parse_field_type(desc)
        .ok_or_else(|| Error::InvalidDescriptor(desc.to_string()))?;
    if !rest.is_empty() {
        return Err(Error::InvalidDescriptor(desc.to_string()));
    }
    Ok(ty)
}

pub fn parse_method_descriptor(desc: &str) -> Result<MethodDescriptor> {
    let invalid = || Error::InvalidDescriptor(desc.to_string());

    let mut rest = desc.strip_prefix('(').ok_or_else(invalid)?;
    let mut params = Vec::new();
    loop {
        if let Some(after) = rest.strip_prefix(')') {
            rest = after;
            break;
        }
        let (param, after) = parse_field_type(rest).ok_or_else(invalid)?;
        params.push(param);
        rest = after;
    }

    let return_type = if rest == "V" {
        ReturnType::Void
    } else {
        let (ty, after) = parse_field_type(rest).ok_or_else(invalid)?;
        if !after.is_empty() {
            return Err(invalid());
        }
        ReturnType::Type(ty)
    };

    Ok(MethodDescriptor { params, return_type })
}

fn parse_field_type(input: &str) -> Option<(FieldType, &str)> {
    let tag = *input.as_bytes().first()?;
    if let Some(base) = BaseType::from_tag(tag) {
        return Some((FieldType::Base(base), &input[1..]));
    }
    match tag {
        b'L' => {
            let end = input.find(';')?;
            let name = input[1..end].to_string();
            Some((FieldType::Object(name), &input[end + 1..]))
        }
        b'[' => {
            let (component, rest) = parse_field_type(&input[1..])?;
            Some((FieldType::Array(Box::new(component)), rest))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_descriptor_primitives_and_arrays() {
        assert_eq!(parse_field_descriptor("Z").unwrap(), FieldType::Base(BaseType::Boolean));
        assert_eq!(
            parse_field_descriptor("[[Ljava/lang/String;").unwrap(),
            FieldType::Array(Box::new(FieldType::Array(Box::new(FieldType::Object(
                "java/lang/String".to_string()
            )))))
        );
        assert!(parse_field_descriptor("Ljava/lang/String").is_err());
        assert!(parse_field_descriptor("II").is_err());
    }

    #[test]
    fn method_descriptor_params_and_return() {
        let desc = parse_method_descriptor("(ILjava/lang/String;)[I").unwrap();
        assert_eq!(
            desc.params,
            vec![
                FieldType::Base(BaseType::Int),
                FieldType::Object("java/lang/String".to_string())
            ]
        );
        assert_eq!(
            desc.return_type,
            ReturnType::Type(FieldType::Array(Box::new(FieldType::Base(BaseType::Int))))
        );

        let desc = parse_method_descriptor("()V").unwrap();
        assert!(desc.params.is_empty());
        assert_eq!(desc.return_type, ReturnType::Void);
    }

    #[test]
    fn peel_array_reports_dimensions() {
        let ty = parse_field_descriptor("[[[I").unwrap();
        let (dims, element) = ty.peel_array();
        assert_eq!(dims, 3);
        assert_eq!(element, &FieldType::Base(BaseType::Int));
    }
}
