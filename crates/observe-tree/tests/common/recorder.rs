use observe_tree::{observe, ChangeRecord, ObservedTree, Value};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

/// Collects every record the callback receives.
#[derive(Clone, Default)]
pub struct Recorder {
    records: Rc<RefCell<Vec<ChangeRecord>>>,
}

impl Recorder {
    pub fn callback(&self) -> impl FnMut(&ChangeRecord) + 'static {
        let records = Rc::clone(&self.records);
        move |record| records.borrow_mut().push(record.clone())
    }

    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    pub fn take(&self) -> Vec<ChangeRecord> {
        std::mem::take(&mut *self.records.borrow_mut())
    }

    pub fn pop(&self) -> Option<ChangeRecord> {
        self.records.borrow_mut().pop()
    }

    /// Pops the last record in wire form.
    pub fn pop_json(&self) -> serde_json::Value {
        self.pop()
            .expect("a record was emitted")
            .to_json()
            .expect("record serializes")
    }

    pub fn take_json(&self) -> Vec<serde_json::Value> {
        self.take()
            .iter()
            .map(|record| record.to_json().expect("record serializes"))
            .collect()
    }
}

pub fn init(tree: impl Into<Value>) -> (ObservedTree, Recorder) {
    let recorder = Recorder::default();
    let tree = observe(tree, recorder.callback()).expect("tree is observable");
    (tree, recorder)
}

/// Dotted path in wire form; all-digit segments become indices.
pub fn wire_path(path: &str) -> serde_json::Value {
    path.split('.')
        .map(|seg| match seg.parse::<u64>() {
            Ok(idx) => json!(idx),
            Err(_) => json!(seg),
        })
        .collect()
}

pub fn ins(path: &str, new_value: serde_json::Value) -> serde_json::Value {
    json!({"path": wire_path(path), "newValue": new_value})
}

pub fn upd(path: &str, old_value: serde_json::Value, new_value: serde_json::Value) -> serde_json::Value {
    json!({"path": wire_path(path), "oldValue": old_value, "newValue": new_value})
}

pub fn del(path: &str, old_value: serde_json::Value) -> serde_json::Value {
    json!({"path": wire_path(path), "oldValue": old_value})
}
