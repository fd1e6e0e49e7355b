//! Shared class hierarchy for the integration tests.
//!
//! ```text
//! java/lang/Object
//! ├── shapes/Shape (abstract, implements Comparable)
//! │   └── shapes/Circle (implements Serializable, Comparable)
//! ├── java/lang/ref/WeakReference (weak reference)
//! ├── java/lang/String (final field)
//! ├── shapes/Color (enum)
//! └── shapes/Holder (boxed value field)
//! shapes/Point  (flattened value type)
//! shapes/Boxed  (value type stored by reference)
//! [I, [Ljava/lang/Object;
//! ```
#![allow(dead_code)]

use std::sync::Arc;

use classenv::{
    metadata::ConstantPoolEntry, ClassBuilder, ClassFlags, ClassHandle, ClassModifiers,
    ClassTable, DepthAndFlags, FieldModifiers,
};

pub struct Fixture {
    pub table: Arc<ClassTable>,
    pub object: ClassHandle,
    pub comparable: ClassHandle,
    pub serializable: ClassHandle,
    pub shape: ClassHandle,
    pub point: ClassHandle,
    pub boxed: ClassHandle,
    pub circle: ClassHandle,
    pub weak: ClassHandle,
    pub holder: ClassHandle,
    pub string: ClassHandle,
    pub color: ClassHandle,
    pub ints: ClassHandle,
    pub objects: ClassHandle,
}

impl Fixture {
    pub fn new() -> Self {
        let table = Arc::new(ClassTable::new());
        let object = ClassBuilder::new("java/lang/Object")
            .class_flags(ClassFlags::RESERVABLE_LOCK_WORD_INIT)
            .build(&table)
            .unwrap();
        let comparable = ClassBuilder::new("java/lang/Comparable")
            .interface()
            .build(&table)
            .unwrap();
        let serializable = ClassBuilder::new("java/io/Serializable")
            .interface()
            .build(&table)
            .unwrap();
        let shape = ClassBuilder::new("shapes/Shape")
            .abstract_class()
            .extends(object)
            .implements(comparable)
            .field("id", "J", 0, FieldModifiers::PROTECTED | FieldModifiers::FINAL)
            .build(&table)
            .unwrap();
        let point = ClassBuilder::new("shapes/Point")
            .value_type(true)
            .field("x", "I", 0, FieldModifiers::PRIVATE | FieldModifiers::FINAL)
            .field("y", "I", 4, FieldModifiers::PRIVATE | FieldModifiers::FINAL)
            .build(&table)
            .unwrap();
        let boxed = ClassBuilder::new("shapes/Boxed")
            .value_type(false)
            .field("v", "D", 0, FieldModifiers::FINAL)
            .build(&table)
            .unwrap();
        let circle = ClassBuilder::new("shapes/Circle")
            .final_class()
            .extends(shape)
            .implements(serializable)
            .implements(comparable)
            .field("COUNT", "I", 0, FieldModifiers::STATIC)
            .field("id", "J", 0, FieldModifiers::PROTECTED | FieldModifiers::FINAL)
            .flattened_field("center", point, 8, FieldModifiers::PRIVATE)
            .field("radius", "D", 16, FieldModifiers::PRIVATE | FieldModifiers::VOLATILE)
            .field("label", "Ljava/lang/String;", 24, FieldModifiers::PRIVATE)
            .constant(ConstantPoolEntry::ClassRef {
                name: b"shapes/Point".to_vec(),
            })
            .constant(ConstantPoolEntry::FieldRef {
                class_ref_index: 1,
                name: b"x".to_vec(),
                signature: b"I".to_vec(),
            })
            .constant(ConstantPoolEntry::ClassRef {
                name: b"Qshapes/Point;".to_vec(),
            })
            .build(&table)
            .unwrap();
        let weak = ClassBuilder::new("java/lang/ref/WeakReference")
            .extends(object)
            .depth_flags(DepthAndFlags::REFERENCE_WEAK)
            .field("referent", "Ljava/lang/Object;", 0, FieldModifiers::PRIVATE)
            .build(&table)
            .unwrap();
        let holder = ClassBuilder::new("shapes/Holder")
            .extends(object)
            .class_flags(ClassFlags::CONTAINS_UNFLATTENED_FLATTENABLES)
            .flattened_field("boxed", boxed, 0, FieldModifiers::empty())
            .field("count", "S", 8, FieldModifiers::empty())
            .build(&table)
            .unwrap();
        let string = ClassBuilder::new("java/lang/String")
            .final_class()
            .extends(object)
            .field("value", "[B", 0, FieldModifiers::PRIVATE | FieldModifiers::FINAL)
            .build(&table)
            .unwrap();
        let color = ClassBuilder::new("shapes/Color")
            .modifiers(ClassModifiers::ENUM | ClassModifiers::FINAL)
            .extends(object)
            .field("ordinal", "I", 0, FieldModifiers::PRIVATE)
            .build(&table)
            .unwrap();
        let ints = ClassBuilder::new("[I").array(2).build(&table).unwrap();
        let objects = ClassBuilder::new("[Ljava/lang/Object;")
            .array(3)
            .build(&table)
            .unwrap();

        Fixture {
            table,
            object,
            comparable,
            serializable,
            shape,
            point,
            boxed,
            circle,
            weak,
            holder,
            string,
            color,
            ints,
            objects,
        }
    }

    pub fn all(&self) -> Vec<ClassHandle> {
        vec![
            self.object,
            self.comparable,
            self.serializable,
            self.shape,
            self.point,
            self.boxed,
            self.circle,
            self.weak,
            self.holder,
            self.string,
            self.color,
            self.ints,
            self.objects,
        ]
    }
}
