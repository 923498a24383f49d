//! Parser for the generic signature grammar (`Signature` attribute).
//!
//! Produces a plain AST; binding type variables to their declarations is the
//! importer's job, not the codec's.

use crate::descriptor::BaseType;
use crate::error::{Error, Result};

/// Signature of a generic class declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub super_class: ClassTypeSignature,
    pub interfaces: Vec<ClassTypeSignature>,
}

/// Signature of a generic method or constructor declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodSignature {
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<TypeSignature>,
    /// `None` for void.
    pub return_type: Option<TypeSignature>,
    pub throws: Vec<ThrowsSignature>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThrowsSignature {
    Class(ClassTypeSignature),
    TypeVariable(String),
}

/// One formal type parameter declaration, e.g. `T extends Number & Cloneable`.
///
/// An interface-only bound leaves `class_bound` empty; translation layers
/// must not invent an implicit `Object` bound in that case.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParameter {
    pub name: String,
    pub class_bound: Option<FieldTypeSignature>,
    pub interface_bounds: Vec<FieldTypeSignature>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldTypeSignature {
    Class(ClassTypeSignature),
    Array(Box<TypeSignature>),
    TypeVariable(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeSignature {
    Base(BaseType),
    Field(FieldTypeSignature),
}

/// A possibly-parameterized class reference, including nested segments
/// (`Lcom/example/Outer<TT;>.Inner<TU;>;`).
#[derive(Debug, Clone, PartialEq)]
pub struct ClassTypeSignature {
    /// Internal name of the outermost segment, e.g. `com/example/Outer`.
    pub name: String,
    pub type_arguments: Vec<TypeArgument>,
    pub inner: Vec<InnerClassSignature>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InnerClassSignature {
    pub name: String,
    pub type_arguments: Vec<TypeArgument>,
}

impl ClassTypeSignature {
    /// Internal binary name of the innermost segment, joining nested
    /// segments with `$` the way the compiler names them.
    pub fn binary_name(&self) -> String {
        let mut name = self.name.clone();
        for segment in &self.inner {
            name.push('$');
            name.push_str(&segment.name);
        }
        name
    }

    /// All type arguments, outermost segment first.
    pub fn all_type_arguments(&self) -> impl Iterator<Item = &TypeArgument> {
        self.type_arguments
            .iter()
            .chain(self.inner.iter().flat_map(|segment| segment.type_arguments.iter()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeArgument {
    /// `*`
    Unbounded,
    /// `+` bound
    Extends(FieldTypeSignature),
    /// `-` bound
    Super(FieldTypeSignature),
    Exact(FieldTypeSignature),
}

pub fn parse_class_signature(sig: &str) -> Result<ClassSignature> {
    let mut parser = SigParser::new(sig);
    let type_parameters = parser.type_parameters_opt()?;
    let super_class = parser.class_type_signature()?;
    let mut interfaces = Vec::new();
    while !parser.at_end() {
        interfaces.push(parser.class_type_signature()?);
    }
    Ok(ClassSignature { type_parameters, super_class, interfaces })
}

pub fn parse_method_signature(sig: &str) -> Result<MethodSignature> {
    let mut parser = SigParser::new(sig);
    let type_parameters = parser.type_parameters_opt()?;
    parser.expect(b'(')?;
    let mut parameters = Vec::new();
    while parser.peek()? != b')' {
        parameters.push(parser.type_signature()?);
    }
    parser.expect(b')')?;
    let return_type = if parser.peek()? == b'V' {
        parser.bump();
        None
    } else {
        Some(parser.type_signature()?)
    };
    let mut throws = Vec::new();
    while !parser.at_end() {
        parser.expect(b'^')?;
        if parser.peek()? == b'T' {
            match parser.field_type_signature()? {
                FieldTypeSignature::TypeVariable(name) => {
                    throws.push(ThrowsSignature::TypeVariable(name));
                }
                _ => return Err(parser.invalid()),
            }
        } else {
            throws.push(ThrowsSignature::Class(parser.class_type_signature()?));
        }
    }
    Ok(MethodSignature { type_parameters, parameters, return_type, throws })
}

pub fn parse_field_signature(sig: &str) -> Result<FieldTypeSignature> {
    let mut parser = SigParser::new(sig);
    let parsed = parser.field_type_signature()?;
    if !parser.at_end() {
        return Err(parser.invalid());
    }
    Ok(parsed)
}

struct SigParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> SigParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn invalid(&self) -> Error {
        Error::InvalidSignature(self.input.to_string())
    }

    fn at_end(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn peek(&self) -> Result<u8> {
        self.input.as_bytes().get(self.pos).copied().ok_or_else(|| self.invalid())
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn expect(&mut self, byte: u8) -> Result<()> {
        if self.peek()? != byte {
            return Err(self.invalid());
        }
        self.bump();
        Ok(())
    }

    /// Consume up to (excluding) the next occurrence of any byte in `stops`.
    fn take_until(&mut self, stops: &[u8]) -> Result<&'a str> {
        let start = self.pos;
        while !self.at_end() && !stops.contains(&self.input.as_bytes()[self.pos]) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.invalid());
        }
        Ok(&self.input[start..self.pos])
    }

    fn type_parameters_opt(&mut self) -> Result<Vec<TypeParameter>> {
        if self.at_end() || self.peek()? != b'<' {
            return Ok(Vec::new());
        }
        self.bump();
        let mut parameters = Vec::new();
        while self.peek()? != b'>' {
            let name = self.take_until(&[b':'])?.to_string();
            self.expect(b':')?;
            // The class bound may be empty (interface-only bounds).
            let class_bound = if self.peek()? == b':' {
                None
            } else {
                Some(self.field_type_signature()?)
            };
            let mut interface_bounds = Vec::new();
            while self.peek()? == b':' {
                self.bump();
                interface_bounds.push(self.field_type_signature()?);
            }
            parameters.push(TypeParameter { name, class_bound, interface_bounds });
        }
        self.bump();
        if parameters.is_empty() {
            return Err(self.invalid());
        }
        Ok(parameters)
    }

    fn type_signature(&mut self) -> Result<TypeSignature> {
        let tag = self.peek()?;
        match tag {
            b'L' | b'[' | b'T' => Ok(TypeSignature::Field(self.field_type_signature()?)),
            _ => match base_type(tag) {
                Some(base) => {
                    self.bump();
                    Ok(TypeSignature::Base(base))
                }
                None => Err(self.invalid()),
            },
        }
    }

    fn field_type_signature(&mut self) -> Result<FieldTypeSignature> {
        match self.peek()? {
            b'L' => Ok(FieldTypeSignature::Class(self.class_type_signature()?)),
            b'[' => {
                self.bump();
                Ok(FieldTypeSignature::Array(Box::new(self.type_signature()?)))
            }
            b'T' => {
                self.bump();
                let name = self.take_until(&[b';'])?.to_string();
                self.expect(b';')?;
                Ok(FieldTypeSignature::TypeVariable(name))
            }
            _ => Err(self.invalid()),
        }
    }

    fn class_type_signature(&mut self) -> Result<ClassTypeSignature> {
        self.expect(b'L')?;
        let name = self.take_until(&[b'<', b';', b'.'])?.to_string();
        let type_arguments = self.type_arguments_opt()?;
        let mut inner = Vec::new();
        while self.peek()? == b'.' {
            self.bump();
            let name = self.take_until(&[b'<', b';', b'.'])?.to_string();
            let type_arguments = self.type_arguments_opt()?;
            inner.push(InnerClassSignature { name, type_arguments });
        }
        self.expect(b';')?;
        Ok(ClassTypeSignature { name, type_arguments, inner })
    }

    fn type_arguments_opt(&mut self) -> Result<Vec<TypeArgument>> {
        if self.peek()? != b'<' {
            return Ok(Vec::new());
        }
        self.bump();
        let mut arguments = Vec::new();
        while self.peek()? != b'>' {
            arguments.push(match self.peek()? {
                b'*' => {
                    self.bump();
                    TypeArgument::Unbounded
                }
                b'+' => {
                    self.bump();
                    TypeArgument::Extends(self.field_type_signature()?)
                }
                b'-' => {
                    self.bump();
                    TypeArgument::Super(self.field_type_signature()?)
                }
                _ => TypeArgument::Exact(self.field_type_signature()?),
            });
        }
        self.bump();
        if arguments.is_empty() {
            return Err(self.invalid());
        }
        Ok(arguments)
    }
}

fn base_type(tag: u8) -> Option<BaseType> {
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
