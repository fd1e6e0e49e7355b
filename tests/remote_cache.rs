//! Remote-mode caching, batching and consistency checking.

mod common;

use std::sync::Arc;

use classenv::{prelude::*, remote::Request, remote::Response};
use common::Fixture;

fn remote(fixture: &Fixture, config: SessionConfig) -> ClassEnv {
    ClassEnv::remote(
        ClientSession::new(config),
        LoopbackStream::new(MetadataServer::new(fixture.table.clone())),
    )
}

fn trips(env: &ClassEnv) -> u64 {
    env.stream_stats().unwrap().round_trips()
}

/// Answers like the owner, except that every flag word after the first has `drift` toggled
struct DriftingStream {
    inner: LoopbackStream,
    drift: ClassFlags,
    flag_reads: u32,
}

impl DriftingStream {
    fn new(fixture: &Fixture, drift: ClassFlags) -> Self {
        DriftingStream {
            inner: LoopbackStream::new(MetadataServer::new(fixture.table.clone())),
            drift,
            flag_reads: 0,
        }
    }
}

impl Stream for DriftingStream {
    fn exchange(&mut self, request: &Request) -> Result<Response> {
        let response = self.inner.exchange(request)?;
        match (request, response) {
            (Request::ClassFlags(_), Response::Flags(flags)) => {
                self.flag_reads += 1;
                if self.flag_reads > 1 {
                    Ok(Response::Flags(flags ^ self.drift.bits()))
                } else {
                    Ok(Response::Flags(flags))
                }
            }
            (_, response) => Ok(response),
        }
    }

    fn stats(&self) -> Arc<StreamStats> {
        self.inner.stats()
    }
}

#[test]
fn repeated_queries_cost_one_fetch() {
    let fixture = Fixture::new();
    let env = remote(&fixture, SessionConfig::production());

    assert_eq!(env.class_depth(fixture.circle).unwrap(), 2);
    assert_eq!(trips(&env), 1);
    assert_eq!(env.class_depth(fixture.circle).unwrap(), 2);
    assert!(!env.has_finalizer(fixture.circle).unwrap());
    assert!(!env.is_special_for_stack_allocation(fixture.circle).unwrap());
    assert_eq!(trips(&env), 1);

    let superclasses = env.superclasses_of(fixture.circle).unwrap();
    assert_eq!(&*superclasses, &[fixture.shape, fixture.object]);
    env.superclasses_of(fixture.circle).unwrap();
    assert_eq!(trips(&env), 2);

    let stats = env.stream_stats().unwrap();
    assert_eq!(stats.requests_of("DepthAndFlags"), 1);
    assert_eq!(stats.requests_of("SuperClasses"), 1);
    assert!(stats.bytes_sent() > 0);
    assert!(stats.bytes_received() > 0);
}

#[test]
fn cached_chain_answers_indexed_superclass() {
    let fixture = Fixture::new();
    let env = remote(&fixture, SessionConfig::production());

    env.superclasses_of(fixture.circle).unwrap();
    env.class_depth(fixture.circle).unwrap();
    let before = trips(&env);
    let root = env.rom_class_of_superclass(fixture.circle, 1).unwrap();
    assert_eq!(root.name, "java/lang/Object");

    // Only the descriptor of the superclass had to be fetched
    assert_eq!(trips(&env), before + 1);
    assert_eq!(env.stream_stats().unwrap().requests_of("IndexedSuperClass"), 0);
}

#[test]
fn interface_table_is_one_round_trip() {
    let fixture = Fixture::new();
    let env = remote(&fixture, SessionConfig::production());

    env.interface_table(fixture.circle).unwrap();
    env.interface_table(fixture.circle).unwrap();
    assert_eq!(trips(&env), 1);

    // The cursor walk pays per node: head, then interface and next for both nodes
    env.walk_interface_table(fixture.circle).unwrap();
    assert_eq!(trips(&env), 1 + 5);
}

#[test]
fn sessions_do_not_share_records() {
    let fixture = Fixture::new();
    let first = remote(&fixture, SessionConfig::production());
    let second = remote(&fixture, SessionConfig::production());

    first.class_instance_size(fixture.circle).unwrap();
    second.class_instance_size(fixture.circle).unwrap();
    assert_eq!(trips(&first), 1);
    assert_eq!(trips(&second), 1);
    assert_ne!(
        first.session().unwrap().id(),
        second.session().unwrap().id()
    );
}

#[test]
fn session_record_collects_fetched_kinds() {
    let fixture = Fixture::new();
    let env = remote(&fixture, SessionConfig::production());

    env.class_depth(fixture.holder).unwrap();
    env.class_instance_size(fixture.holder).unwrap();
    env.class_name(fixture.holder).unwrap();

    let record = env.session().unwrap().store().record(fixture.holder);
    assert_eq!(record.depth_and_flags.map(DepthAndFlags::depth_of), Some(1));
    assert!(record.class_flags.is_none());
    assert_eq!(record.total_instance_size, Some(10));
    assert!(record.has_descriptor);
    assert!(record.superclasses.is_none());
}

#[test]
fn verification_passes_for_consistent_owner() {
    let fixture = Fixture::new();
    let env = remote(&fixture, SessionConfig::verification());

    assert!(env.is_value_type(fixture.point).unwrap());
    assert!(env.is_value_type(fixture.point).unwrap());
    // One cached read plus one authoritative read per masked query
    assert_eq!(env.stream_stats().unwrap().requests_of("ClassFlags"), 3);
}

#[test]
fn verification_detects_divergent_flags() {
    let fixture = Fixture::new();
    let env = ClassEnv::remote(
        ClientSession::new(SessionConfig::verification()),
        DriftingStream::new(&fixture, ClassFlags::IS_VALUE_TYPE),
    );

    let error = env.is_value_type(fixture.point).unwrap_err();
    assert!(error.is_programmer_error());
    match error {
        Error::ConsistencyMismatch {
            class,
            mask,
            cached,
            authoritative,
        } => {
            assert_eq!(class, fixture.point);
            assert_eq!(mask, ClassFlags::IS_VALUE_TYPE.bits());
            assert_eq!(cached, ClassFlags::IS_VALUE_TYPE.bits());
            assert_eq!(authoritative, 0);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn verification_ignores_bits_outside_mask() {
    let fixture = Fixture::new();
    let env = ClassEnv::remote(
        ClientSession::new(SessionConfig::verification()),
        DriftingStream::new(&fixture, ClassFlags::HAS_ILLEGAL_FINAL_FIELD_MODIFICATIONS),
    );

    assert!(env.is_value_type(fixture.point).unwrap());
    assert!(!env.is_zero_initializable(fixture.holder).unwrap());
}

#[test]
fn production_never_cross_checks() {
    let fixture = Fixture::new();
    let env = ClassEnv::remote(
        ClientSession::new(SessionConfig::production()),
        DriftingStream::new(&fixture, ClassFlags::IS_VALUE_TYPE),
    );

    assert!(env.is_value_type(fixture.point).unwrap());
    assert!(env.is_value_type(fixture.point).unwrap());
    assert_eq!(env.stream_stats().unwrap().requests_of("ClassFlags"), 1);

    // The uncached read sees the drifted word
    let fresh = env.class_flags_value(fixture.point).unwrap();
    assert_eq!(fresh & ClassFlags::IS_VALUE_TYPE.bits(), 0);
}

#[test]
fn bit_extraction_yields_zero_or_the_bit() {
    let fixture = Fixture::new();
    let env = remote(&fixture, SessionConfig::production());
    let bit = ClassFlags::RESERVABLE_LOCK_WORD_INIT.bits();

    assert_eq!(env.reservable_lock_word_init(fixture.object).unwrap(), bit);
    assert_eq!(env.reservable_lock_word_init(fixture.circle).unwrap(), 0);
    assert!(env.is_zero_initializable(fixture.circle).unwrap());
    assert!(!env.is_zero_initializable(fixture.holder).unwrap());
}

#[test]
fn concrete_class_predicate_prefers_cached_descriptors() {
    let fixture = Fixture::new();
    let candidates = [fixture.comparable, fixture.shape, fixture.circle, fixture.object];

    // Both concrete classes already cached: decided without a round trip
    let warm = remote(&fixture, SessionConfig::production());
    warm.descriptor_of(fixture.object).unwrap();
    warm.descriptor_of(fixture.circle).unwrap();
    let before = trips(&warm);
    assert!(!warm.contains_zero_or_one_concrete_class(&candidates).unwrap());
    assert_eq!(trips(&warm), before);

    // Only the abstract classes cached: the uncached part has to be fetched
    let cold = remote(&fixture, SessionConfig::production());
    cold.descriptor_of(fixture.comparable).unwrap();
    cold.descriptor_of(fixture.shape).unwrap();
    let before = trips(&cold);
    assert!(!cold.contains_zero_or_one_concrete_class(&candidates).unwrap());
    assert_eq!(trips(&cold), before + 2);

    let local = ClassEnv::local(fixture.table.clone());
    assert!(!local.contains_zero_or_one_concrete_class(&candidates).unwrap());
    assert!(local
        .contains_zero_or_one_concrete_class(&[fixture.comparable, fixture.circle])
        .unwrap());
    assert!(local.contains_zero_or_one_concrete_class(&[]).unwrap());
}

#[test]
fn concrete_class_predicate_agrees_whatever_is_cached() {
    let fixture = Fixture::new();
    let local = ClassEnv::local(fixture.table.clone());
    let one_concrete = [fixture.comparable, fixture.shape, fixture.circle];

    // Abstract part cached, the concrete class fetched
    let env = remote(&fixture, SessionConfig::production());
    env.descriptor_of(fixture.comparable).unwrap();
    env.descriptor_of(fixture.shape).unwrap();
    let before = trips(&env);
    assert!(env.contains_zero_or_one_concrete_class(&one_concrete).unwrap());
    assert_eq!(trips(&env), before + 1);

    // Concrete class cached, abstract part fetched
    let env = remote(&fixture, SessionConfig::production());
    env.descriptor_of(fixture.circle).unwrap();
    let before = trips(&env);
    assert!(env.contains_zero_or_one_concrete_class(&one_concrete).unwrap());
    assert_eq!(trips(&env), before + 2);
    assert!(local.contains_zero_or_one_concrete_class(&one_concrete).unwrap());

    let no_concrete = [fixture.comparable, fixture.serializable, fixture.shape];
    let env = remote(&fixture, SessionConfig::production());
    assert!(env.contains_zero_or_one_concrete_class(&no_concrete).unwrap());
    assert_eq!(trips(&env), 3);
    assert!(local.contains_zero_or_one_concrete_class(&no_concrete).unwrap());

    // A repeated handle counts once per occurrence in both modes
    let repeated = [fixture.circle, fixture.comparable, fixture.circle];
    assert!(!local.contains_zero_or_one_concrete_class(&repeated).unwrap());
    let env = remote(&fixture, SessionConfig::production());
    assert!(!env.contains_zero_or_one_concrete_class(&repeated).unwrap());
    assert_eq!(trips(&env), 2);
    let before = trips(&env);
    assert!(!env.contains_zero_or_one_concrete_class(&repeated).unwrap());
    assert_eq!(trips(&env), before);
}

#[test]
fn flatness_follows_the_value_class() {
    let fixture = Fixture::new();
    let env = remote(&fixture, SessionConfig::production());

    assert!(env.is_field_flattened(fixture.circle, "center").unwrap());
    assert!(!env.is_field_flattened(fixture.circle, "radius").unwrap());
    assert!(!env.is_field_flattened(fixture.holder, "boxed").unwrap());
    assert_eq!(env.flattened_field_type(fixture.holder, "boxed").unwrap(), fixture.boxed);

    let layout = env.enumerate_fields(fixture.holder).unwrap();
    let summary: Vec<(i32, DataKind, &str)> = layout
        .iter()
        .map(|entry| (entry.offset, entry.kind, entry.name.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![(8, DataKind::Address, "boxed"), (16, DataKind::Int32, "count")]
    );
}

#[test]
fn header_size_shifts_every_offset() {
    let fixture = Fixture::new();
    let env = remote(
        &fixture,
        SessionConfig::production().with_object_header_size(16),
    );

    let layout = env.enumerate_fields(fixture.circle).unwrap();
    let offsets: Vec<i32> = layout.iter().map(|entry| entry.offset).collect();
    assert_eq!(offsets, vec![16, 24, 28, 32, 40]);
}
