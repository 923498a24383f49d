#![no_main]

use libfuzzer_sys::fuzz_target;

mod utils;

fuzz_target!(|data: &[u8]| {
    let Some(text) = utils::truncate_utf8(data) else {
        return;
    };
    let _ = quarry_classfile::parse_class_signature(text);
    let _ = quarry_classfile::parse_method_signature(text);
    let _ = quarry_classfile::parse_field_signature(text);
    let _ = quarry_classfile::parse_field_descriptor(text);
    let _ = quarry_classfile::parse_method_descriptor(text);
});
