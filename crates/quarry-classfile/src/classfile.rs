use crate::annotation::Annotation;
use crate::code::{parse_code, CodeAttribute};
use crate::constant_pool::{ConstantPool, CpInfo, MethodHandleInfo};
use crate::error::{Error, Result};
use crate::reader::Reader;

/// A structurally parsed class file.
///
/// Names are internal binary names (`java/lang/String`); nothing here is
/// resolved against other classes.
#[derive(Debug, Clone)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    pub this_class: String,
    pub super_class: Option<String>,
    pub interfaces: Vec<String>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
    pub inner_classes: Vec<InnerClassInfo>,
    pub enclosing_method: Option<EnclosingMethodInfo>,
    pub source_file: Option<String>,
    pub is_record: bool,
    pub bootstrap_methods: Vec<BootstrapMethod>,
}

#[derive(Debug, Clone)]
pub struct FieldInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
    pub exceptions: Vec<String>,
    pub code: Option<CodeAttribute>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InnerClassInfo {
    pub inner_class: String,
    pub outer_class: Option<String>,
    pub inner_name: Option<String>,
    pub access_flags: u16,
}

/// The `EnclosingMethod` attribute of a local/anonymous class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosingMethodInfo {
    pub class_name: String,
    pub method: Option<(String, String)>,
}

/// One `BootstrapMethods` table entry, with its static arguments resolved as
/// far as invokedynamic linkage needs them.
#[derive(Debug, Clone)]
pub struct BootstrapMethod {
    pub method: MethodHandleInfo,
    pub arguments: Vec<BootstrapArgument>,
}

#[derive(Debug, Clone)]
pub enum BootstrapArgument {
    MethodHandle(MethodHandleInfo),
    MethodType(String),
    Other,
}

impl ClassFile {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut reader = Reader::new(bytes);
        let magic = reader.read_u4()?;
        if magic != 0xCAFEBABE {
            return Err(Error::InvalidMagic(magic));
        }

        let minor_version = reader.read_u2()?;
        let major_version = reader.read_u2()?;
        let cp = ConstantPool::parse(&mut reader)?;

        let access_flags = reader.read_u2()?;
        let this_class = cp.get_class_name(reader.read_u2()?)?;
        let super_class_idx = reader.read_u2()?;
        let super_class = if super_class_idx == 0 {
            None
        } else {
            Some(cp.get_class_name(super_class_idx)?)
        };

        let interfaces_count = reader.read_u2()? as usize;
        let mut interfaces = Vec::with_capacity(interfaces_count);
        for _ in 0..interfaces_count {
            interfaces.push(cp.get_class_name(reader.read_u2()?)?);
        }

        let fields_count = reader.read_u2()? as usize;
        let mut fields = Vec::with_capacity(fields_count);
        for _ in 0..fields_count {
            let access_flags = reader.read_u2()?;
            let name = cp.get_utf8(reader.read_u2()?)?.to_string();
            let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
            let attrs = parse_attributes(&mut reader, &cp, AttributeTarget::Field)?;
            fields.push(FieldInfo {
                access_flags,
                name,
                descriptor,
                signature: attrs.signature,
                annotations: attrs.annotations,
            });
        }

        let methods_count = reader.read_u2()? as usize;
        let mut methods = Vec::with_capacity(methods_count);
        for _ in 0..methods_count {
            let access_flags = reader.read_u2()?;
            let name = cp.get_utf8(reader.read_u2()?)?.to_string();
            let descriptor = cp.get_utf8(reader.read_u2()?)?.to_string();
            let attrs = parse_attributes(&mut reader, &cp, AttributeTarget::Method)?;
            methods.push(MethodInfo {
                access_flags,
                name,
                descriptor,
                signature: attrs.signature,
                annotations: attrs.annotations,
                exceptions: attrs.exceptions,
                code: attrs.code,
            });
        }

        let class_attrs = parse_attributes(&mut reader, &cp, AttributeTarget::Class)?;

        reader.ensure_empty()?;

        Ok(Self {
            minor_version,
            major_version,
            access_flags,
            this_class,
            super_class,
            interfaces,
            fields,
            methods,
            signature: class_attrs.signature,
            annotations: class_attrs.annotations,
            inner_classes: class_attrs.inner_classes,
            enclosing_method: class_attrs.enclosing_method,
            source_file: class_attrs.source_file,
            is_record: class_attrs.is_record,
            bootstrap_methods: class_attrs.bootstrap_methods,
        })
    }
}

#[derive(Default)]
struct ParsedAttributes {
    signature: Option<String>,
    annotations: Vec<Annotation>,
    inner_classes: Vec<InnerClassInfo>,
    enclosing_method: Option<EnclosingMethodInfo>,
    source_file: Option<String>,
    is_record: bool,
    bootstrap_methods: Vec<BootstrapMethod>,
    exceptions: Vec<String>,
    code: Option<CodeAttribute>,
}

enum AttributeTarget {
    Class,
    Field,
    Method,
}

fn parse_attributes(
    reader: &mut Reader<'_>,
    cp: &ConstantPool,
    target: AttributeTarget,
) -> Result<ParsedAttributes> {
    let attributes_count = reader.read_u2()? as usize;
    let mut parsed = ParsedAttributes::default();
    for _ in 0..attributes_count {
        let name_index = reader.read_u2()?;
        let length = reader.read_u4()? as usize;
        let info = reader.read_bytes(length)?;
        let name = cp.get_utf8(name_index)?;

        let mut sub = Reader::new(info);
        match name {
            "Signature" => {
                let sig_index = sub.read_u2()?;
                parsed.signature = Some(cp.get_utf8(sig_index)?.to_string());
                sub.ensure_empty()?;
            }
            "RuntimeVisibleAnnotations" | "RuntimeInvisibleAnnotations" => {
                let num = sub.read_u2()? as usize;
                for _ in 0..num {
                    parsed.annotations.push(Annotation::parse(&mut sub, cp)?);
                }
                sub.ensure_empty()?;
            }
            "InnerClasses" if matches!(target, AttributeTarget::Class) => {
                let num = sub.read_u2()? as usize;
                for _ in 0..num {
                    let inner_class_info_index = sub.read_u2()?;
                    let outer_class_info_index = sub.read_u2()?;
                    let inner_name_index = sub.read_u2()?;
                    let inner_access_flags = sub.read_u2()?;

                    let inner_class = cp.get_class_name(inner_class_info_index)?;
                    let outer_class = if outer_class_info_index == 0 {
                        None
                    } else {
                        Some(cp.get_class_name(outer_class_info_index)?)
                    };
                    let inner_name = if inner_name_index == 0 {
                        None
                    } else {
                        Some(cp.get_utf8(inner_name_index)?.to_string())
                    };

                    parsed.inner_classes.push(InnerClassInfo {
                        inner_class,
                        outer_class,
                        inner_name,
                        access_flags: inner_access_flags,
                    });
                }
                sub.ensure_empty()?;
            }
            "EnclosingMethod" if matches!(target, AttributeTarget::Class) => {
                let class_index = sub.read_u2()?;
                let method_index = sub.read_u2()?;
                let class_name = cp.get_class_name(class_index)?;
                let method = if method_index == 0 {
                    None
                } else {
                    Some(cp.get_name_and_type(method_index)?)
                };
                parsed.enclosing_method = Some(EnclosingMethodInfo { class_name, method });
                sub.ensure_empty()?;
            }
            "SourceFile" if matches!(target, AttributeTarget::Class) => {
                let index = sub.read_u2()?;
                parsed.source_file = Some(cp.get_utf8(index)?.to_string());
                sub.ensure_empty()?;
            }
            "Record" if matches!(target, AttributeTarget::Class) => {
                // Component details are not modeled; the attribute's presence
                // marks the class as a record.
                parsed.is_record = true;
            }
            "BootstrapMethods" if matches!(target, AttributeTarget::Class) => {
                let num = sub.read_u2()? as usize;
                for _ in 0..num {
                    let method_ref_index = sub.read_u2()?;
                    let method = cp.get_method_handle(method_ref_index)?;
                    let num_args = sub.read_u2()? as usize;
                    let mut arguments = Vec::with_capacity(num_args);
                    for _ in 0..num_args {
                        let arg_index = sub.read_u2()?;
                        arguments.push(match cp.get(arg_index)? {
                            CpInfo::MethodHandle { .. } => {
                                BootstrapArgument::MethodHandle(cp.get_method_handle(arg_index)?)
                            }
                            CpInfo::MethodType { descriptor_index } => {
                                BootstrapArgument::MethodType(
                                    cp.get_utf8(*descriptor_index)?.to_string(),
                                )
                            }
                            _ => BootstrapArgument::Other,
                        });
                    }
                    parsed.bootstrap_methods.push(BootstrapMethod { method, arguments });
                }
                sub.ensure_empty()?;
            }
            "Exceptions" if matches!(target, AttributeTarget::Method) => {
                let num = sub.read_u2()? as usize;
                for _ in 0..num {
                    parsed.exceptions.push(cp.get_class_name(sub.read_u2()?)?);
                }
                sub.ensure_empty()?;
            }
            "Code" if matches!(target, AttributeTarget::Method) => {
                parsed.code = Some(parse_code(&mut sub, cp)?);
                sub.ensure_empty()?;
            }
            _ => {
                // Unknown attribute: intentionally skipped.
            }
        }
    }

    Ok(parsed)
}
