//! Local and remote mode must answer every query identically.
//!
//! Each test runs the same queries against a [`ClassEnv`] reading the class table directly
//! and against one fetching through a loopback stream, and compares the results.

mod common;

use classenv::prelude::*;
use common::Fixture;

fn environments(fixture: &Fixture, config: SessionConfig) -> (ClassEnv, ClassEnv) {
    let local = ClassEnv::local_with_config(fixture.table.clone(), config);
    let session = ClientSession::new(config);
    let remote = ClassEnv::remote(
        session,
        LoopbackStream::new(MetadataServer::new(fixture.table.clone())),
    );
    (local, remote)
}

/// Everything a compiler might ask about one class, errors rendered as strings
fn survey(env: &ClassEnv, class: ClassHandle) -> Vec<String> {
    fn show<T: std::fmt::Debug>(result: Result<T>) -> String {
        match result {
            Ok(value) => format!("{value:?}"),
            Err(error) => format!("error: {error}"),
        }
    }

    vec![
        show(env.class_flags(class)),
        show(env.depth_and_flags(class)),
        show(env.class_depth(class)),
        show(env.class_instance_size(class)),
        show(env.is_special_for_stack_allocation(class)),
        show(env.has_finalizer(class)),
        show(env.reservable_lock_word_init(class)),
        show(env.is_value_type(class)),
        show(env.is_zero_initializable(class)),
        show(env.has_illegal_static_final_field_modification(class)),
        show(env.class_name(class)),
        show(env.is_interface(class)),
        show(env.is_abstract(class)),
        show(env.is_final(class)),
        show(env.is_primitive(class)),
        show(env.is_array(class)),
        show(env.is_primitive_array(class)),
        show(env.is_reference_array(class)),
        show(env.array_element_width(class)),
        show(env.constant_pool_of(class)),
        show(env.is_class_ref_value_type(class, 1)),
        show(env.is_class_ref_value_type(class, 3)),
        show(env.is_enum(class)),
        show(env.is_string_class(class)),
        show(env.has_final_fields(class)),
        show(env.class_name_chars(class)),
        show(env.class_signature(class)),
        show(env.superclasses_of(class)),
        show(env.rom_class_of_superclass(class, 0).map(|d| d.name.clone())),
        show(env.interface_table(class)),
        show(env.walk_interface_table(class)),
        show(env.declared_fields(class)),
        show(env.flattened_fields(class)),
        show(env.enumerate_fields(class)),
    ]
}

#[test]
fn every_query_agrees() {
    let fixture = Fixture::new();
    let (local, remote) = environments(&fixture, SessionConfig::verification());

    for class in fixture.all() {
        assert_eq!(
            survey(&local, class),
            survey(&remote, class),
            "modes disagree about {class}"
        );
    }
}

#[test]
fn second_pass_is_served_from_cache() {
    let fixture = Fixture::new();
    let (local, remote) = environments(&fixture, SessionConfig::production());

    for class in fixture.all() {
        survey(&remote, class);
    }
    for class in fixture.all() {
        assert_eq!(survey(&local, class), survey(&remote, class));
    }
    assert!(remote.session().unwrap().store().hits() > 0);
}

#[test]
fn interface_table_matches_cursor_walk() {
    let fixture = Fixture::new();
    let (local, remote) = environments(&fixture, SessionConfig::production());

    for env in [&local, &remote] {
        let batched = env.interface_table(fixture.circle).unwrap();
        let walked = env.walk_interface_table(fixture.circle).unwrap();
        assert_eq!(&*batched, walked.as_slice());
        assert_eq!(walked, vec![fixture.serializable, fixture.comparable]);

        let head = env.itable_of(fixture.circle).unwrap().unwrap();
        assert_eq!(
            env.itable_rom_class(head).unwrap().name,
            "java/io/Serializable"
        );
        assert!(env.itable_of(fixture.object).unwrap().is_none());
    }
}

#[test]
fn unknown_class_fails_alike() {
    let fixture = Fixture::new();
    let (local, remote) = environments(&fixture, SessionConfig::production());
    let missing = ClassHandle::new(0xdead_0000);

    for env in [&local, &remote] {
        assert!(matches!(
            env.class_depth(missing),
            Err(Error::UnknownClass(handle)) if handle == missing
        ));
        assert!(matches!(
            env.descriptor_of(missing),
            Err(Error::UnknownClass(_))
        ));
        assert!(matches!(
            env.itable_next(ITableNode(u32::MAX)),
            Err(Error::UnknownITableNode(_))
        ));
    }
}

#[test]
fn circle_layout() {
    let fixture = Fixture::new();
    let (local, remote) = environments(&fixture, SessionConfig::production());

    for env in [&local, &remote] {
        let layout = env.enumerate_fields(fixture.circle).unwrap();
        let summary: Vec<(i32, DataKind, &str)> = layout
            .iter()
            .map(|entry| (entry.offset, entry.kind, entry.name.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                (8, DataKind::Int64, "id"),
                (16, DataKind::Int32, "center.x"),
                (20, DataKind::Int32, "center.y"),
                (24, DataKind::Float64, "radius"),
                (32, DataKind::Address, "label"),
            ]
        );
        let mut spans: Vec<(i32, u32)> = layout
            .iter()
            .map(|entry| (entry.offset, entry.kind.size()))
            .collect();
        spans.sort_unstable();
        for pair in spans.windows(2) {
            let (offset, size) = pair[0];
            assert!(offset + size as i32 <= pair[1].0, "{pair:?} overlap");
        }
        assert!(layout.find("radius").unwrap().is_volatile);
        assert!(layout.find("center.x").unwrap().is_private);
        assert_eq!(env.class_instance_size(fixture.circle).unwrap(), 32);
    }
}

#[test]
fn class_kind_queries() {
    let fixture = Fixture::new();
    let (local, remote) = environments(&fixture, SessionConfig::production());

    for env in [&local, &remote] {
        assert!(env.is_string_class(fixture.string).unwrap());
        assert!(env.is_enum(fixture.color).unwrap());
        assert!(!env.is_enum(fixture.circle).unwrap());
        assert!(env.has_final_fields(fixture.circle).unwrap());
        assert!(!env.has_final_fields(fixture.holder).unwrap());
        assert_eq!(env.class_signature(fixture.circle).unwrap(), "Lshapes/Circle;");
        assert_eq!(env.class_signature(fixture.objects).unwrap(), "[Ljava/lang/Object;");
        assert_eq!(env.class_name_chars(fixture.point).unwrap(), b"shapes/Point");
        assert!(!env.is_class_ref_value_type(fixture.circle, 1).unwrap());
        assert!(env.is_class_ref_value_type(fixture.circle, 3).unwrap());
        assert!(matches!(
            env.is_class_ref_value_type(fixture.circle, 2),
            Err(Error::ConstantPoolKind { index: 2, .. })
        ));
    }
}
