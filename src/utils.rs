/// Number of workgroups of `workgroup_size` threads needed to cover `count` items.
pub fn workgroup_count(count: u32, workgroup_size: u32) -> u32 {
    count.div_ceil(workgroup_size)
}

/// Size and member offsets of a struct declared in a WGSL source.
#[cfg(test)]
pub struct WgslStruct {
    pub size: u32,
    pub offsets: Vec<u32>,
}

/// Parses and validates `source`, then looks up the layout naga computes for `name`.
#[cfg(test)]
pub fn wgsl_struct(source: &str, name: &str) -> WgslStruct {
    use naga::valid::{Capabilities, ValidationFlags, Validator};

    let module = naga::front::wgsl::parse_str(source)
        .unwrap_or_else(|e| panic!("{}", e.emit_to_string(source)));
    Validator::new(ValidationFlags::all(), Capabilities::empty())
        .validate(&module)
        .unwrap_or_else(|e| panic!("invalid shader: {e:?}"));

    let layout = module
        .types
        .iter()
        .find_map(|(_, ty)| match &ty.inner {
            naga::TypeInner::Struct { members, span } if ty.name.as_deref() == Some(name) => {
                Some(WgslStruct {
                    size: *span,
                    offsets: members.iter().map(|m| m.offset).collect(),
                })
            }
            _ => None,
        })
        .unwrap_or_else(|| panic!("no struct {name} in shader"));
    layout
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_up_to_cover_every_item() {
        assert_eq!(workgroup_count(0, 256), 0);
        assert_eq!(workgroup_count(1, 256), 1);
        assert_eq!(workgroup_count(256, 256), 1);
        assert_eq!(workgroup_count(257, 256), 2);
        assert_eq!(workgroup_count(2_000_000, 256), 7813);
        assert!(workgroup_count(2_000_000, 256) * 256 >= 2_000_000);
    }

    #[test]
    fn struct_layout_follows_wgsl_alignment() {
        let layout = wgsl_struct(
            "struct S { a: f32, b: vec4<f32>, c: vec2<f32> }",
            "S",
        );
        assert_eq!(layout.offsets, [0, 16, 32]);
        assert_eq!(layout.size, 48);
    }
}
