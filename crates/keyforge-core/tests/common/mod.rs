use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, OnceLock};

use keyforge_core::meta::MemberKind;
use keyforge_core::resource::builder;
use keyforge_core::{
    AccessorTable, KeyEngine, Reflect, Resource, ResourceBuilder, ResourceError, TypeInfo,
    TypeRef, Value,
};

/// Engine with a private accessor table so tests do not share resolutions
#[allow(dead_code)]
pub fn new_engine() -> KeyEngine {
    KeyEngine::default().with_accessor_table(Arc::new(AccessorTable::new()))
}

// ========== Reflectable fixtures ==========

#[derive(Debug, Clone, Default)]
pub struct Address {
    pub city: Option<String>,
}

#[allow(dead_code)]
pub fn address_type() -> Arc<TypeInfo> {
    static TYPE: OnceLock<Arc<TypeInfo>> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeInfo::builder("Address")
            .getter("get_city", TypeRef::string())
            .build()
    })
    .clone()
}

impl Reflect for Address {
    fn type_info(&self) -> Arc<TypeInfo> {
        address_type()
    }

    fn get(&self, kind: MemberKind, slot: usize) -> Value {
        match (kind, slot) {
            (MemberKind::Getter, 0) => self.city.clone().into(),
            _ => Value::Null,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Person {
    pub name: Option<String>,
    pub age: i64,
    pub address: Option<Arc<Address>>,
}

#[allow(dead_code)]
pub fn person_type() -> Arc<TypeInfo> {
    static TYPE: OnceLock<Arc<TypeInfo>> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeInfo::builder("Person")
            .getter("get_name", TypeRef::string())
            .getter("get_address", TypeRef::Object(address_type))
            .field("age", TypeRef::int())
            .build()
    })
    .clone()
}

impl Reflect for Person {
    fn type_info(&self) -> Arc<TypeInfo> {
        person_type()
    }

    fn get(&self, kind: MemberKind, slot: usize) -> Value {
        match (kind, slot) {
            (MemberKind::Getter, 0) => self.name.clone().into(),
            (MemberKind::Getter, 1) => self.address.clone().into(),
            (MemberKind::Field, 0) => self.age.into(),
            _ => Value::Null,
        }
    }
}

#[allow(dead_code)]
pub fn person(name: Option<&str>, city: Option<Option<&str>>) -> Value {
    Value::object(Person {
        name: name.map(str::to_string),
        age: 30,
        address: city.map(|c| {
            Arc::new(Address {
                city: c.map(str::to_string),
            })
        }),
    })
}

/// DTO holding a free-form map, reached as `valueDto.map.<key>`
#[derive(Debug, Clone, Default)]
pub struct ValueDto {
    pub map: BTreeMap<String, Value>,
}

#[allow(dead_code)]
pub fn value_dto_type() -> Arc<TypeInfo> {
    static TYPE: OnceLock<Arc<TypeInfo>> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeInfo::builder("ValueDto")
            .getter("get_map", TypeRef::Map)
            .build()
    })
    .clone()
}

impl Reflect for ValueDto {
    fn type_info(&self) -> Arc<TypeInfo> {
        value_dto_type()
    }

    fn get(&self, kind: MemberKind, slot: usize) -> Value {
        match (kind, slot) {
            (MemberKind::Getter, 0) => self.map.clone().into(),
            _ => Value::Null,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TestDto {
    pub value_dto: Option<Arc<ValueDto>>,
}

#[allow(dead_code)]
pub fn test_dto_type() -> Arc<TypeInfo> {
    static TYPE: OnceLock<Arc<TypeInfo>> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeInfo::builder("TestDto")
            .getter("get_valueDto", TypeRef::Object(value_dto_type))
            .build()
    })
    .clone()
}

impl Reflect for TestDto {
    fn type_info(&self) -> Arc<TypeInfo> {
        test_dto_type()
    }

    fn get(&self, kind: MemberKind, slot: usize) -> Value {
        match (kind, slot) {
            (MemberKind::Getter, 0) => self.value_dto.clone().into(),
            _ => Value::Null,
        }
    }
}

#[allow(dead_code)]
pub fn test_dto(age: Option<i64>) -> Value {
    let mut map = BTreeMap::new();
    if let Some(age) = age {
        map.insert("age".to_string(), Value::from(age));
    }
    Value::object(TestDto {
        value_dto: Some(Arc::new(ValueDto { map })),
    })
}

/// Singly linked node; `next` refers back to its own type
#[derive(Debug, Clone, Default)]
pub struct Node {
    pub label: Option<String>,
    pub next: Option<Arc<Node>>,
}

#[allow(dead_code)]
pub fn node_type() -> Arc<TypeInfo> {
    static TYPE: OnceLock<Arc<TypeInfo>> = OnceLock::new();
    TYPE.get_or_init(|| {
        TypeInfo::builder("Node")
            .getter("get_label", TypeRef::string())
            .getter("get_next", TypeRef::Object(node_type))
            .build()
    })
    .clone()
}

impl Reflect for Node {
    fn type_info(&self) -> Arc<TypeInfo> {
        node_type()
    }

    fn get(&self, kind: MemberKind, slot: usize) -> Value {
        match (kind, slot) {
            (MemberKind::Getter, 0) => self.label.clone().into(),
            (MemberKind::Getter, 1) => self.next.clone().into(),
            _ => Value::Null,
        }
    }
}

/// Chain of `len` nodes; the last one carries `tail_label`
#[allow(dead_code)]
pub fn node_chain(len: usize, tail_label: Option<&str>) -> Value {
    let mut node = Node {
        label: tail_label.map(str::to_string),
        next: None,
    };
    for i in 1..len {
        node = Node {
            label: Some(format!("n{}", len - 1 - i)),
            next: Some(Arc::new(node)),
        };
    }
    Value::object(node)
}

// ========== Recording resources ==========

/// Shared journal of acquire/release calls, in order
#[derive(Debug, Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

#[allow(dead_code)]
impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn count(&self, entry: &str) -> usize {
        self.entries().iter().filter(|e| e.as_str() == entry).count()
    }
}

pub struct RecordingResource {
    key: String,
    journal: Journal,
    fail_acquire: bool,
    fail_release: bool,
}

impl Resource for RecordingResource {
    fn key(&self) -> &str {
        &self.key
    }

    fn acquire(&mut self) -> Result<(), ResourceError> {
        if self.fail_acquire {
            self.journal.record(format!("acquire-failed:{}", self.key));
            return Err(format!("lock {} is held elsewhere", self.key).into());
        }
        self.journal.record(format!("acquire:{}", self.key));
        Ok(())
    }

    fn release(&mut self) -> Result<(), ResourceError> {
        self.journal.record(format!("release:{}", self.key));
        if self.fail_release {
            return Err(format!("lease for {} already expired", self.key).into());
        }
        Ok(())
    }
}

/// Builder whose resources fail to acquire when the key is in `fail_acquire`
/// and fail to release when it is in `fail_release`
#[allow(dead_code)]
pub fn recording_builder(
    journal: &Journal,
    fail_acquire: &[&str],
    fail_release: &[&str],
) -> ResourceBuilder {
    let journal = journal.clone();
    let fail_acquire: Vec<String> = fail_acquire.iter().map(|s| s.to_string()).collect();
    let fail_release: Vec<String> = fail_release.iter().map(|s| s.to_string()).collect();
    builder(move |key: &str| -> Result<Box<dyn Resource>, ResourceError> {
        Ok(Box::new(RecordingResource {
            key: key.to_string(),
            journal: journal.clone(),
            fail_acquire: fail_acquire.iter().any(|k| k == key),
            fail_release: fail_release.iter().any(|k| k == key),
        }))
    })
}
