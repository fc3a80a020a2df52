//! Named template registry: lazily built, cached sequences keyed by name.
//!
//! - Names are case-insensitive; re-registering a name replaces the factory and
//!   drops its cached instance.
//! - Parameterized templates cache one instance per distinct parameter value.
//! - Factories run outside the lock; the first finished build wins.

use std::fmt;
use std::sync::{Arc, Mutex};

use hashbrown::HashMap;
use log::debug;

use crate::error::{AnimationError, Result};
use crate::sequence::Sequence;
use crate::stored_sequence::parse_stored_sequence_json;
use crate::target::{lock, Animatable};

pub type TemplateFactory<T> = Arc<dyn Fn() -> Sequence<T> + Send + Sync>;
pub type ParamTemplateFactory<T> = Arc<dyn Fn(f32) -> Sequence<T> + Send + Sync>;

struct Registered<F> {
    category: String,
    factory: F,
}

struct Tables<T: Animatable> {
    plain: HashMap<String, Registered<TemplateFactory<T>>>,
    param: HashMap<String, Registered<ParamTemplateFactory<T>>>,
    cache: HashMap<String, Arc<Sequence<T>>>,
    param_cache: HashMap<(String, u32), Arc<Sequence<T>>>,
}

impl<T: Animatable> Default for Tables<T> {
    fn default() -> Self {
        Self {
            plain: HashMap::new(),
            param: HashMap::new(),
            cache: HashMap::new(),
            param_cache: HashMap::new(),
        }
    }
}

pub struct TemplateRegistry<T: Animatable> {
    tables: Mutex<Tables<T>>,
}

impl<T: Animatable> Default for TemplateRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Animatable> fmt::Debug for TemplateRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tables = lock(&self.tables);
        f.debug_struct("TemplateRegistry")
            .field("templates", &tables.plain.len())
            .field("param_templates", &tables.param.len())
            .field("cached", &(tables.cache.len() + tables.param_cache.len()))
            .finish()
    }
}

fn key(name: &str) -> String {
    name.to_lowercase()
}

/// Cache key for a parameter; `-0.0` and `0.0` share an entry.
fn param_bits(p: f32) -> u32 {
    if p == 0.0 {
        0.0f32.to_bits()
    } else {
        p.to_bits()
    }
}

impl<T: Animatable> TemplateRegistry<T> {
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
        }
    }

    pub fn register(
        &self,
        category: impl Into<String>,
        name: &str,
        factory: impl Fn() -> Sequence<T> + Send + Sync + 'static,
    ) {
        let name = key(name);
        let mut tables = lock(&self.tables);
        tables.cache.remove(&name);
        tables.plain.insert(
            name,
            Registered {
                category: category.into(),
                factory: Arc::new(factory),
            },
        );
    }

    pub fn register_param(
        &self,
        category: impl Into<String>,
        name: &str,
        factory: impl Fn(f32) -> Sequence<T> + Send + Sync + 'static,
    ) {
        let name = key(name);
        let mut tables = lock(&self.tables);
        tables.param_cache.retain(|(n, _), _| *n != name);
        tables.param.insert(
            name,
            Registered {
                category: category.into(),
                factory: Arc::new(factory),
            },
        );
    }

    /// Register a template described by stored sequence JSON under its own name.
    ///
    /// The JSON is parsed once here; lookups hand out clones of the result.
    pub fn register_stored(&self, category: impl Into<String>, json: &str) -> Result<String> {
        let seq = parse_stored_sequence_json::<T>(json)?;
        let name = seq.name().to_string();
        self.register(category, &name, move || seq.clone());
        Ok(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        let name = key(name);
        let tables = lock(&self.tables);
        tables.plain.contains_key(&name) || tables.param.contains_key(&name)
    }

    /// Cached instance of `name`, building it on first use.
    pub fn get(&self, name: &str) -> Result<Arc<Sequence<T>>> {
        let k = key(name);
        let factory = {
            let tables = lock(&self.tables);
            if let Some(hit) = tables.cache.get(&k) {
                return Ok(Arc::clone(hit));
            }
            match tables.plain.get(&k) {
                Some(entry) => Arc::clone(&entry.factory),
                None => {
                    return Err(AnimationError::TemplateNotFound {
                        name: name.to_string(),
                    })
                }
            }
        };

        let built = Arc::new(factory());
        debug!("built template '{k}'");
        let mut tables = lock(&self.tables);
        Ok(Arc::clone(tables.cache.entry(k).or_insert(built)))
    }

    /// Cached instance of parameterized template `name` for `param`.
    pub fn get_param(&self, name: &str, param: f32) -> Result<Arc<Sequence<T>>> {
        let k = (key(name), param_bits(param));
        let factory = {
            let tables = lock(&self.tables);
            if let Some(hit) = tables.param_cache.get(&k) {
                return Ok(Arc::clone(hit));
            }
            match tables.param.get(&k.0) {
                Some(entry) => Arc::clone(&entry.factory),
                None => {
                    return Err(AnimationError::TemplateNotFound {
                        name: name.to_string(),
                    })
                }
            }
        };

        let built = Arc::new(factory(param));
        debug!("built template '{}' for {param}", k.0);
        let mut tables = lock(&self.tables);
        Ok(Arc::clone(tables.param_cache.entry(k).or_insert(built)))
    }

    /// Template names in `category`, sorted.
    pub fn names(&self, category: &str) -> Vec<String> {
        let tables = lock(&self.tables);
        let mut names: Vec<String> = tables
            .plain
            .iter()
            .map(|(n, r)| (n, &r.category))
            .chain(tables.param.iter().map(|(n, r)| (n, &r.category)))
            .filter(|(_, c)| c.eq_ignore_ascii_case(category))
            .map(|(n, _)| n.clone())
            .collect();
        names.sort();
        names.dedup();
        names
    }

    pub fn categories(&self) -> Vec<String> {
        let tables = lock(&self.tables);
        let mut cats: Vec<String> = tables
            .plain
            .values()
            .map(|r| r.category.clone())
            .chain(tables.param.values().map(|r| r.category.clone()))
            .collect();
        cats.sort();
        cats.dedup();
        cats
    }

    /// Drop every cached instance; factories stay registered.
    pub fn clear_cache(&self) {
        let mut tables = lock(&self.tables);
        tables.cache.clear();
        tables.param_cache.clear();
    }
}
