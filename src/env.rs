//! The hashed, single-scope environment: DJB2-hashed separate chaining over
//! 16 buckets, insert-overwrites semantics, no nested scoping.

use inkwell::values::{FunctionValue, PointerValue};

use crate::types::{FnParam, Type};

const INITIAL_BUCKETS: usize = 16;

fn djb2(name: &str) -> u32 {
    let mut hash: u32 = 5381;
    for b in name.bytes() {
        hash = hash.wrapping_shl(5).wrapping_add(hash).wrapping_add(b as u32);
    }
    hash
}

/// One `Environment` entry, tagged by what it binds. `storage_handle` for a
/// `Variable` is a stack alloca in batch mode and a module global in REPL
/// mode; both are `PointerValue`s to the caller, so one field serves both.
#[derive(Clone)]
pub enum EnvEntry<'ctx> {
    Variable {
        ty: Type,
        storage: PointerValue<'ctx>,
    },
    /// `arity_max == -1` means unbounded; `arity_min <= 0 && arity_max == -1`
    /// means fully variadic.
    Builtin { arity_min: i32, arity_max: i32 },
    Function {
        params: Vec<FnParam>,
        return_type: Type,
        function: FunctionValue<'ctx>,
    },
}

#[derive(Clone)]
struct Entry<'ctx> {
    name: String,
    entry: EnvEntry<'ctx>,
    docstring: Option<String>,
}

/// Separate-chaining hash table over `EnvEntry`. A `define` (or
/// `insert_function`) overwrites a name that already exists, including its
/// docstring; no resizing ever happens, matching the source's fixed
/// 16-bucket table.
pub struct Environment<'ctx> {
    buckets: Vec<Vec<Entry<'ctx>>>,
    count: usize,
}

impl<'ctx> Default for Environment<'ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'ctx> Environment<'ctx> {
    pub fn new() -> Self {
        Self {
            buckets: (0..INITIAL_BUCKETS).map(|_| Vec::new()).collect(),
            count: 0,
        }
    }

    fn bucket_index(&self, name: &str) -> usize {
        (djb2(name) as usize) % self.buckets.len()
    }

    fn insert_raw(&mut self, name: &str, entry: EnvEntry<'ctx>, docstring: Option<String>) {
        let idx = self.bucket_index(name);
        let bucket = &mut self.buckets[idx];
        if let Some(existing) = bucket.iter_mut().find(|e| e.name == name) {
            existing.entry = entry;
            existing.docstring = docstring;
            return;
        }
        bucket.insert(
            0,
            Entry {
                name: name.to_string(),
                entry,
                docstring,
            },
        );
        self.count += 1;
    }

    pub fn insert(&mut self, name: &str, ty: Type, storage: PointerValue<'ctx>) {
        self.insert_raw(name, EnvEntry::Variable { ty, storage }, None);
    }

    pub fn insert_with_doc(
        &mut self,
        name: &str,
        ty: Type,
        storage: PointerValue<'ctx>,
        docstring: Option<String>,
    ) {
        self.insert_raw(name, EnvEntry::Variable { ty, storage }, docstring);
    }

    pub fn insert_builtin(&mut self, name: &str, arity_min: i32, arity_max: i32) {
        self.insert_raw(name, EnvEntry::Builtin { arity_min, arity_max }, None);
    }

    pub fn insert_function(
        &mut self,
        name: &str,
        params: Vec<FnParam>,
        return_type: Type,
        function: FunctionValue<'ctx>,
        docstring: Option<String>,
    ) {
        self.insert_raw(
            name,
            EnvEntry::Function {
                params,
                return_type,
                function,
            },
            docstring,
        );
    }

    pub fn lookup(&self, name: &str) -> Option<&EnvEntry<'ctx>> {
        let idx = self.bucket_index(name);
        self.buckets[idx]
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.entry)
    }

    pub fn docstring(&self, name: &str) -> Option<&str> {
        let idx = self.bucket_index(name);
        self.buckets[idx]
            .iter()
            .find(|e| e.name == name)
            .and_then(|e| e.docstring.as_deref())
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Entry names currently bound, in bucket-then-chain order, the same
    /// order `print` walks, and the order REPL tab-completion offers them.
    pub fn names(&self) -> Vec<&str> {
        self.buckets
            .iter()
            .flat_map(|b| b.iter().map(|e| e.name.as_str()))
            .collect()
    }

    /// Environment dump: one line per entry in the Scheme-style
    /// signature form.
    pub fn format_dump(&self) -> String {
        let mut out = format!("Env ({} entries):\n", self.count);
        for bucket in &self.buckets {
            for entry in bucket {
                out.push_str("  ");
                out.push_str(&format_entry_line(&entry.name, &entry.entry, entry.docstring.as_deref()));
                out.push('\n');
            }
        }
        out
    }
}

fn format_entry_line(name: &str, entry: &EnvEntry, docstring: Option<&str>) -> String {
    let body = match entry {
        EnvEntry::Variable { ty, .. } => format!("[{name} :: {ty}]"),
        EnvEntry::Builtin { arity_min, arity_max } => {
            let sig = format_builtin_signature(*arity_min, *arity_max);
            format!("[{name} :: Fn ({sig})]")
        }
        EnvEntry::Function { params, return_type, .. } => {
            let sig = params
                .iter()
                .map(|p| p.name.clone().unwrap_or_else(|| "_".to_string()))
                .collect::<Vec<_>>()
                .join(" ");
            format!("[{name} :: Fn ({sig}) -> {return_type}]")
        }
    };
    match docstring {
        Some(doc) => format!("{body}  ; {doc}"),
        None => body,
    }
}

fn format_builtin_signature(arity_min: i32, arity_max: i32) -> String {
    if arity_min <= 0 && arity_max == -1 {
        return "_".to_string();
    }
    if arity_max == -1 {
        let required = vec!["_"; arity_min.max(0) as usize].join(" ");
        return format!("{required} . _");
    }
    if arity_min == arity_max {
        return vec!["_"; arity_min as usize].join(" ");
    }
    let required = vec!["_"; arity_min as usize].join(" ");
    let optional_count = (arity_max - arity_min).max(0) as usize;
    let optionals = vec!["_"; optional_count].join(" ");
    if required.is_empty() {
        format!("#:optional {optionals}")
    } else {
        format!("{required} #:optional {optionals}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn djb2_matches_known_vector() {
        // hash=5381; for each byte hash = hash*33 + byte.
        let mut expected: u32 = 5381;
        for b in "abc".bytes() {
            expected = expected.wrapping_mul(33).wrapping_add(b as u32);
        }
        assert_eq!(djb2("abc"), expected);
    }

    #[test]
    fn builtin_signature_required_then_rest() {
        assert_eq!(format_builtin_signature(1, -1), "_ . _");
    }

    #[test]
    fn builtin_signature_fully_variadic() {
        assert_eq!(format_builtin_signature(0, -1), "_");
    }

    #[test]
    fn builtin_signature_fixed_arity() {
        assert_eq!(format_builtin_signature(1, 1), "_");
    }
}
