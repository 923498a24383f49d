use crate::error::{Error, Result};
use crate::reader::Reader;

/// One parsed constant pool entry.
///
/// Entries that refer to other entries keep the raw indices; the accessor
/// methods on [`ConstantPool`] follow them.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum CpInfo {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class { name_index: u16 },
    String { string_index: u16 },
    FieldRef { class_index: u16, name_and_type_index: u16 },
    MethodRef { class_index: u16, name_and_type_index: u16 },
    InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
    NameAndType { name_index: u16, descriptor_index: u16 },
    MethodHandle { reference_kind: u8, reference_index: u16 },
    MethodType { descriptor_index: u16 },
    Dynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
    Module { name_index: u16 },
    Package { name_index: u16 },
    /// Second slot of a Long/Double entry. Never directly referenced.
    Unusable,
}

impl CpInfo {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            CpInfo::Utf8(_) => "Utf8",
            CpInfo::Integer(_) => "Integer",
            CpInfo::Float(_) => "Float",
            CpInfo::Long(_) => "Long",
            CpInfo::Double(_) => "Double",
            CpInfo::Class { .. } => "Class",
            CpInfo::String { .. } => "String",
            CpInfo::FieldRef { .. } => "Fieldref",
            CpInfo::MethodRef { .. } => "Methodref",
            CpInfo::InterfaceMethodRef { .. } => "InterfaceMethodref",
            CpInfo::NameAndType { .. } => "NameAndType",
            CpInfo::MethodHandle { .. } => "MethodHandle",
            CpInfo::MethodType { .. } => "MethodType",
            CpInfo::Dynamic { .. } => "Dynamic",
            CpInfo::InvokeDynamic { .. } => "InvokeDynamic",
            CpInfo::Module { .. } => "Module",
            CpInfo::Package { .. } => "Package",
            CpInfo::Unusable => "Unusable",
        }
    }
}

/// How a `MethodHandle` constant refers to its member.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    GetField,
    GetStatic,
    PutField,
    PutStatic,
    InvokeVirtual,
    InvokeStatic,
    InvokeSpecial,
    NewInvokeSpecial,
    InvokeInterface,
}

impl ReferenceKind {
    fn from_raw(raw: u8) -> Result<Self> {
        Ok(match raw {
            1 => ReferenceKind::GetField,
            2 => ReferenceKind::GetStatic,
            3 => ReferenceKind::PutField,
            4 => ReferenceKind::PutStatic,
            5 => ReferenceKind::InvokeVirtual,
            6 => ReferenceKind::InvokeStatic,
            7 => ReferenceKind::InvokeSpecial,
            8 => ReferenceKind::NewInvokeSpecial,
            9 => ReferenceKind::InvokeInterface,
            _ => return Err(Error::MalformedAttribute("MethodHandle")),
        })
    }
}

/// A fully-resolved member reference (`Fieldref`/`Methodref`/`InterfaceMethodref`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    pub class_name: String,
    pub name: String,
    pub descriptor: String,
    pub is_interface: bool,
}

/// A fully-resolved `MethodHandle` constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodHandleInfo {
    pub kind: ReferenceKind,
    pub class_name: String,
    pub name: String,
    pub descriptor: String,
}

pub(crate) struct ConstantPool {
    entries: Vec<CpInfo>,
}

impl ConstantPool {
    pub(crate) fn parse(reader: &mut Reader<'_>) -> Result<Self> {
        let count = reader.read_u2()? as usize;
        // Index 0 is unusable by definition.
        let mut entries = vec![CpInfo::Unusable];
        while entries.len() < count {
            let tag = reader.read_u1()?;
            let (entry, takes_two_slots) = match tag {
                1 => {
                    let len = reader.read_u2()? as usize;
                    let bytes = reader.read_bytes(len)?;
                    (CpInfo::Utf8(decode_modified_utf8(bytes)?), false)
                }
                3 => (CpInfo::Integer(reader.read_u4()? as i32), false),
                4 => (CpInfo::Float(f32::from_bits(reader.read_u4()?)), false),
                5 => {
                    let high = reader.read_u4()? as u64;
                    let low = reader.read_u4()? as u64;
                    (CpInfo::Long(((high << 32) | low) as i64), true)
                }
                6 => {
                    let high = reader.read_u4()? as u64;
                    let low = reader.read_u4()? as u64;
                    (CpInfo::Double(f64::from_bits((high << 32) | low)), true)
                }
                7 => (CpInfo::Class { name_index: reader.read_u2()? }, false),
                8 => (CpInfo::String { string_index: reader.read_u2()? }, false),
                9 => (
                    CpInfo::FieldRef {
                        class_index: reader.read_u2()?,
                        name_and_type_index: reader.read_u2()?,
                    },
                    false,
                ),
                10 => (
                    CpInfo::MethodRef {
                        class_index: reader.read_u2()?,
                        name_and_type_index: reader.read_u2()?,
                    },
                    false,
                ),
                11 => (
                    CpInfo::InterfaceMethodRef {
                        class_index: reader.read_u2()?,
                        name_and_type_index: reader.read_u2()?,
                    },
                    false,
                ),
                12 => (
                    CpInfo::NameAndType {
                        name_index: reader.read_u2()?,
                        descriptor_index: reader.read_u2()?,
                    },
                    false,
                ),
                15 => (
                    CpInfo::MethodHandle {
                        reference_kind: reader.read_u1()?,
                        reference_index: reader.read_u2()?,
                    },
                    false,
                ),
                16 => (CpInfo::MethodType { descriptor_index: reader.read_u2()? }, false),
                17 => (
                    CpInfo::Dynamic {
                        bootstrap_method_attr_index: reader.read_u2()?,
                        name_and_type_index: reader.read_u2()?,
                    },
                    false,
                ),
                18 => (
                    CpInfo::InvokeDynamic {
                        bootstrap_method_attr_index: reader.read_u2()?,
                        name_and_type_index: reader.read_u2()?,
                    },
                    false,
                ),
                19 => (CpInfo::Module { name_index: reader.read_u2()? }, false),
                20 => (CpInfo::Package { name_index: reader.read_u2()? }, false),
                other => return Err(Error::InvalidConstantPoolTag(other)),
            };
            entries.push(entry);
            if takes_two_slots {
                entries.push(CpInfo::Unusable);
            }
        }
        Ok(Self { entries })
    }

    pub(crate) fn get(&self, index: u16) -> Result<&CpInfo> {
        match self.entries.get(index as usize) {
            None | Some(CpInfo::Unusable) => Err(Error::InvalidConstantPoolIndex(index)),
            Some(entry) => Ok(entry),
        }
    }

    fn mismatch(&self, index: u16, expected: &'static str) -> Result<Error> {
        Ok(Error::ConstantPoolTypeMismatch {
            index,
            expected,
            found: self.get(index)?.kind(),
        })
    }

    pub(crate) fn get_utf8(&self, index: u16) -> Result<&str> {
        match self.get(index)? {
            CpInfo::Utf8(s) => Ok(s),
            _ => Err(self.mismatch(index, "Utf8")?),
        }
    }

    pub(crate) fn get_class_name(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            CpInfo::Class { name_index } => Ok(self.get_utf8(*name_index)?.to_string()),
            _ => Err(self.mismatch(index, "Class")?),
        }
    }

    pub(crate) fn get_string_constant(&self, index: u16) -> Result<String> {
        match self.get(index)? {
            CpInfo::String { string_index } => Ok(self.get_utf8(*string_index)?.to_string()),
            _ => Err(self.mismatch(index, "String")?),
        }
    }

    pub(crate) fn get_name_and_type(&self, index: u16) -> Result<(String, String)> {
        match self.get(index)? {
            CpInfo::NameAndType { name_index, descriptor_index } => Ok((
                self.get_utf8(*name_index)?.to_string(),
                self.get_utf8(*descriptor_index)?.to_string(),
            )),
            _ => Err(self.mismatch(index, "NameAndType")?),
        }
    }

    pub(crate) fn get_member_ref(&self, index: u16) -> Result<MemberRef> {
        let (class_index, name_and_type_index, is_interface) = match self.get(index)? {
            CpInfo::FieldRef { class_index, name_and_type_index } => {
                (*class_index, *name_and_type_index, false)
            }
            CpInfo::MethodRef { class_index, name_and_type_index } => {
                (*class_index, *name_and_type_index, false)
            }
            CpInfo::InterfaceMethodRef { class_index, name_and_type_index } => {
                (*class_index, *name_and_type_index, true)
            }
            _ => return Err(self.mismatch(index, "Fieldref/Methodref")?),
        };
        let (name, descriptor) = self.get_name_and_type(name_and_type_index)?;
        Ok(MemberRef {
            class_name: self.get_class_name(class_index)?,
            name,
            descriptor,
            is_interface,
        })
    }

    pub(crate) fn get_method_handle(&self, index: u16) -> Result<MethodHandleInfo> {
        match self.get(index)? {
            CpInfo::MethodHandle { reference_kind, reference_index } => {
                let member = self.get_member_ref(*reference_index)?;
                Ok(MethodHandleInfo {
                    kind: ReferenceKind::from_raw(*reference_kind)?,
                    class_name: member.class_name,
                    name: member.name,
                    descriptor: member.descriptor,
                })
            }
            _ => Err(self.mismatch(index, "MethodHandle")?),
        }
    }

    pub(crate) fn get_invoke_dynamic(&self, index: u16) -> Result<(u16, String, String)> {
        match self.get(index)? {
            CpInfo::InvokeDynamic { bootstrap_method_attr_index, name_and_type_index } => {
                let (name, descriptor) = self.get_name_and_type(*name_and_type_index)?;
                Ok((*bootstrap_method_attr_index, name, descriptor))
            }
            _ => Err(self.mismatch(index, "InvokeDynamic")?),
        }
    }
}

/// Decode the class file format's "modified UTF-8".
///
/// NUL is encoded as `C0 80`, and supplementary characters as surrogate
/// pairs of 3-byte sequences, so the decode goes through UTF-16 code units.
fn decode_modified_utf8(bytes: &[u8]) -> Result<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let a = bytes[i];
        if a & 0x80 == 0 {
            if a == 0 {
                return Err(Error::InvalidModifiedUtf8);
            }
            units.push(a as u16);
            i += 1;
        } else if a & 0xE0 == 0xC0 {
            let b = *bytes.get(i + 1).ok_or(Error::InvalidModifiedUtf8)?;
            if b & 0xC0 != 0x80 {
                return Err(Error::InvalidModifiedUtf8);
            }
            units.push((((a & 0x1F) as u16) << 6) | (b & 0x3F) as u16);
            i += 2;
        } else if a & 0xF0 == 0xE0 {
            let b = *bytes.get(i + 1).ok_or(Error::InvalidModifiedUtf8)?;
            let c = *bytes.get(i + 2).ok_or(Error::InvalidModifiedUtf8)?;
            if b & 0xC0 != 0x80 || c & 0xC0 != 0x80 {
                return Err(Error::InvalidModifiedUtf8);
            }
            units.push((((a & 0x0F) as u16) << 12) | (((b & 0x3F) as u16) << 6) | (c & 0x3F) as u16);
            i += 3;
        } else {
            return Err(Error::InvalidModifiedUtf8);
        }
    }
    String::from_utf16(&units).map_err(|_| Error::InvalidModifiedUtf8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modified_utf8_encodes_nul_as_two_bytes() {
        assert_eq!(decode_modified_utf8(&[0xC0, 0x80]).unwrap(), "\0");
        assert!(decode_modified_utf8(&[0x00]).is_err());
    }

    #[test]
    fn modified_utf8_decodes_supplementary_pairs() {
        // U+1D11E (musical G clef) as a CESU-8 surrogate pair.
        let bytes = [0xED, 0xA0, 0xB4, 0xED, 0xB4, 0x9E];
        assert_eq!(decode_modified_utf8(&bytes).unwrap(), "\u{1D11E}");
    }
}
