//! Property descriptor resolution
//!
//! Walks a role's declared and inherited methods, most-specific first, and
//! derives one `PropertyDescriptor` per accessor accepted by the candidate
//! predicate. Results are cached per role; role definitions are immutable so
//! the cache never needs invalidation.

use crate::descriptor::{Cardinality, PropertyDescriptor, SetterSig};
use parking_lot::RwLock;
use persona_core::{
    ConfigurationError, DeclaredMethod, MethodSig, ResolverConfig, RoleCatalog, RoleDef, RoleName,
    ValueType,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Decides which methods are property getters
pub trait CandidatePredicate: Send + Sync {
    /// Whether `sig`, declared by `role`, is a property getter
    fn is_property(&self, role: &RoleDef, sig: &MethodSig) -> bool;
}

/// Getter naming convention or explicit backing identifier
#[derive(Debug, Clone, Copy)]
pub struct ConventionPredicate {
    /// Accept `isX` for boolean getters
    pub boolean_is_prefix: bool,
}

impl Default for ConventionPredicate {
    fn default() -> Self {
        Self {
            boolean_is_prefix: true,
        }
    }
}

impl CandidatePredicate for ConventionPredicate {
    fn is_property(&self, _role: &RoleDef, sig: &MethodSig) -> bool {
        if !sig.params.is_empty() || sig.returns == ValueType::Void {
            return false;
        }
        sig.backing.is_some() || getter_stem(sig, self.boolean_is_prefix).is_some()
    }
}

/// Every accessor pair, regardless of naming convention
///
/// Accepts what `ConventionPredicate` accepts, plus any zero-argument method
/// for which the role also declares a matching single-argument mutator.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessorPairPredicate {
    convention: ConventionPredicate,
}

impl CandidatePredicate for AccessorPairPredicate {
    fn is_property(&self, role: &RoleDef, sig: &MethodSig) -> bool {
        if self.convention.is_property(role, sig) {
            return true;
        }
        if !sig.params.is_empty() || sig.returns == ValueType::Void {
            return false;
        }
        setter_names(sig, None)
            .iter()
            .any(|name| role.find(name, std::slice::from_ref(&sig.returns)).is_some())
    }
}

/// The part of a getter name after its conventional prefix
///
/// `getX` always qualifies; `isX` only when the getter returns a boolean
/// and the `is` prefix is enabled.
pub fn getter_stem(sig: &MethodSig, boolean_is_prefix: bool) -> Option<&str> {
    if let Some(stem) = sig.name.strip_prefix("get") {
        if !stem.is_empty() {
            return Some(stem);
        }
    }
    if boolean_is_prefix && sig.returns == ValueType::Boolean {
        if let Some(stem) = sig.name.strip_prefix("is") {
            if !stem.is_empty() {
                return Some(stem);
            }
        }
    }
    None
}

/// Lower-case the first character unless the first two are upper-case
///
/// `Name` becomes `name`; `URL` and `URLPath` are left untouched.
pub fn decapitalize(stem: &str) -> String {
    let mut chars = stem.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if let Some(second) = chars.next() {
        if first.is_uppercase() && second.is_uppercase() {
            return stem.to_string();
        }
    }
    let mut name: String = first.to_lowercase().collect();
    name.push_str(&stem[first.len_utf8()..]);
    name
}

/// Property name of a getter: decapitalized stem, or the method name itself
pub fn property_name(sig: &MethodSig, boolean_is_prefix: bool) -> String {
    match getter_stem(sig, boolean_is_prefix) {
        Some(stem) => decapitalize(stem),
        None => sig.name.clone(),
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Candidate setter names for a getter, most conventional first
fn setter_names(sig: &MethodSig, stem: Option<&str>) -> Vec<String> {
    let stem = stem.map(str::to_string).unwrap_or_else(|| capitalize(&sig.name));
    vec![format!("set{stem}"), sig.name.clone()]
}

/// Derives and caches property descriptors per role
pub struct PropertyResolver {
    catalog: Arc<RoleCatalog>,
    predicate: Arc<dyn CandidatePredicate>,
    config: ResolverConfig,
    cache: RwLock<HashMap<RoleName, Arc<[PropertyDescriptor]>>>,
}

impl std::fmt::Debug for PropertyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyResolver")
            .field("config", &self.config)
            .field("cached_roles", &self.cache.read().len())
            .finish()
    }
}

impl PropertyResolver {
    /// Resolver using the getter convention
    pub fn new(catalog: Arc<RoleCatalog>, config: ResolverConfig) -> Self {
        let predicate = ConventionPredicate {
            boolean_is_prefix: config.boolean_is_prefix,
        };
        Self::with_predicate(catalog, config, Arc::new(predicate))
    }

    /// Resolver with a custom candidate predicate
    pub fn with_predicate(
        catalog: Arc<RoleCatalog>,
        config: ResolverConfig,
        predicate: Arc<dyn CandidatePredicate>,
    ) -> Self {
        Self {
            catalog,
            predicate,
            config,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Role catalog this resolver reads
    pub fn catalog(&self) -> &Arc<RoleCatalog> {
        &self.catalog
    }

    /// Descriptors of a role, including inherited properties
    pub fn resolve(&self, role: &RoleName) -> Result<Arc<[PropertyDescriptor]>, ConfigurationError> {
        if let Some(cached) = self.cache.read().get(role) {
            return Ok(cached.clone());
        }

        let descriptors: Arc<[PropertyDescriptor]> = self.derive(role)?.into();
        tracing::debug!(%role, properties = descriptors.len(), "resolved role properties");
        // A concurrent resolution of the same role produced an equal result
        Ok(self
            .cache
            .write()
            .entry(role.clone())
            .or_insert(descriptors)
            .clone())
    }

    /// Descriptors of several roles, first declaration of each property wins
    pub fn resolve_all<'a>(
        &self,
        roles: impl IntoIterator<Item = &'a RoleName>,
    ) -> Result<Vec<PropertyDescriptor>, ConfigurationError> {
        let mut seen = HashSet::new();
        let mut all = Vec::new();
        for role in roles {
            for descriptor in self.resolve(role)?.iter() {
                if seen.insert((descriptor.declaring_role.clone(), descriptor.name.clone())) {
                    all.push(descriptor.clone());
                }
            }
        }
        Ok(all)
    }

    fn derive(&self, role: &RoleName) -> Result<Vec<PropertyDescriptor>, ConfigurationError> {
        let mut names = HashSet::new();
        let mut descriptors = Vec::new();
        for DeclaredMethod { role: declaring, sig } in self.catalog.methods_of(role)? {
            let def = self.catalog.require(&declaring)?;
            if !self.predicate.is_property(&def, &sig) {
                continue;
            }
            let name = property_name(&sig, self.config.boolean_is_prefix);
            if !names.insert(name.clone()) {
                continue;
            }
            let setter = self.find_setter(&def, &sig)?;
            descriptors.push(PropertyDescriptor {
                predicate: sig
                    .backing
                    .clone()
                    .unwrap_or_else(|| def.derived_predicate(&name)),
                name,
                declaring_role: declaring,
                getter: sig.name.clone(),
                setter,
                cardinality: if sig.returns.is_collection() {
                    Cardinality::Multi
                } else {
                    Cardinality::Single
                },
                element_type: sig.returns.element().clone(),
                attributes: sig.attributes.clone(),
            });
        }
        Ok(descriptors)
    }

    /// Setter for a getter, searched on the declaring role and its ancestors
    fn find_setter(
        &self,
        declaring: &RoleDef,
        getter: &MethodSig,
    ) -> Result<Option<SetterSig>, ConfigurationError> {
        let stem = getter_stem(getter, self.config.boolean_is_prefix);
        let visible = self.catalog.methods_of(&declaring.name)?;
        for candidate in setter_names(getter, stem) {
            let found = visible.iter().find(|m| {
                m.sig.name == candidate && m.sig.params == std::slice::from_ref(&getter.returns)
            });
            let Some(setter) = found else {
                continue;
            };
            if self.valid_setter_return(&declaring.name, &setter.sig.returns) {
                return Ok(Some(SetterSig {
                    name: setter.sig.name.clone(),
                    returns: setter.sig.returns.clone(),
                }));
            }
            if self.config.strict_setters {
                return Err(ConfigurationError::InvalidSetter {
                    role: declaring.name.clone(),
                    setter: setter.sig.name.clone(),
                    returns: setter.sig.returns.clone(),
                });
            }
            tracing::warn!(
                role = %declaring.name,
                setter = %setter.sig.name,
                "ignoring setter with invalid return type; property is read-only"
            );
            return Ok(None);
        }
        Ok(None)
    }

    fn valid_setter_return(&self, declaring: &RoleName, returns: &ValueType) -> bool {
        match returns {
            ValueType::Void => true,
            ValueType::Role(target) => self.catalog.is_assignable(declaring, target),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use persona_core::PropertyAttribute;

    fn resolver(catalog: RoleCatalog) -> PropertyResolver {
        PropertyResolver::new(Arc::new(catalog), ResolverConfig::default())
    }

    #[test]
    fn test_name_derivation() {
        let get_url = MethodSig::getter("getURL", ValueType::Text);
        let get_name = MethodSig::getter("getName", ValueType::Text);
        let is_active = MethodSig::getter("isActive", ValueType::Boolean);
        let is_text = MethodSig::getter("isbn", ValueType::Text);

        assert_eq!(property_name(&get_url, true), "URL");
        assert_eq!(property_name(&get_name, true), "name");
        assert_eq!(property_name(&is_active, true), "active");
        assert_eq!(property_name(&is_text, true), "isbn");
        assert_eq!(getter_stem(&is_active, false), None);
    }

    #[test]
    fn test_decapitalize_edge_cases() {
        assert_eq!(decapitalize(""), "");
        assert_eq!(decapitalize("X"), "x");
        assert_eq!(decapitalize("Xy"), "xy");
        assert_eq!(decapitalize("XY"), "XY");
        assert_eq!(decapitalize("URLPath"), "URLPath");
        assert_eq!(decapitalize("Éclair"), "éclair");
    }

    #[test]
    fn test_bare_prefix_is_not_a_getter() {
        let get = MethodSig::getter("get", ValueType::Text);
        assert!(!ConventionPredicate::default().is_property(&RoleDef::new("R"), &get));
    }

    #[test]
    fn test_read_only_without_setter() {
        let catalog = RoleCatalog::new();
        catalog
            .register(
                RoleDef::new("Document")
                    .namespace("http://example.org/doc#")
                    .method(MethodSig::getter("getTitle", ValueType::Text))
                    .method(MethodSig::setter("setTitle", ValueType::Text))
                    .method(MethodSig::getter("getChecksum", ValueType::Text)),
            )
            .unwrap();
        let descriptors = resolver(catalog).resolve(&"Document".into()).unwrap();

        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].name, "title");
        assert_eq!(
            descriptors[0].predicate.as_str(),
            "http://example.org/doc#title"
        );
        assert!(!descriptors[0].is_read_only());
        assert_eq!(descriptors[1].name, "checksum");
        assert!(descriptors[1].is_read_only());
    }

    #[test]
    fn test_setter_with_wrong_parameter_is_ignored() {
        let catalog = RoleCatalog::new();
        catalog
            .register(
                RoleDef::new("Counter")
                    .method(MethodSig::getter("getCount", ValueType::Integer))
                    .method(MethodSig::setter("setCount", ValueType::Text)),
            )
            .unwrap();
        let descriptors = resolver(catalog).resolve(&"Counter".into()).unwrap();
        assert!(descriptors[0].is_read_only());
    }

    #[test]
    fn test_invalid_setter_return_is_configuration_error() {
        let catalog = RoleCatalog::new();
        catalog
            .register(
                RoleDef::new("Broken")
                    .method(MethodSig::getter("getName", ValueType::Text))
                    .method(
                        MethodSig::setter("setName", ValueType::Text).returning(ValueType::Integer),
                    ),
            )
            .unwrap();
        let err = resolver(catalog).resolve(&"Broken".into()).unwrap_err();
        assert!(matches!(err, ConfigurationError::InvalidSetter { .. }));
    }

    #[test]
    fn test_lenient_setters_make_property_read_only() {
        let catalog = RoleCatalog::new();
        catalog
            .register(
                RoleDef::new("Broken")
                    .method(MethodSig::getter("getName", ValueType::Text))
                    .method(
                        MethodSig::setter("setName", ValueType::Text).returning(ValueType::Integer),
                    ),
            )
            .unwrap();
        let config = ResolverConfig {
            strict_setters: false,
            ..ResolverConfig::default()
        };
        let resolver = PropertyResolver::new(Arc::new(catalog), config);
        let descriptors = resolver.resolve(&"Broken".into()).unwrap();
        assert!(descriptors[0].is_read_only());
    }

    #[test]
    fn test_fluent_setter_returning_ancestor() {
        let catalog = RoleCatalog::new();
        catalog.register(RoleDef::new("Thing")).unwrap();
        catalog
            .register(
                RoleDef::new("Named")
                    .extends("Thing")
                    .method(MethodSig::getter("getName", ValueType::Text))
                    .method(
                        MethodSig::setter("setName", ValueType::Text)
                            .returning(ValueType::Role("Thing".into())),
                    ),
            )
            .unwrap();
        let descriptors = resolver(catalog).resolve(&"Named".into()).unwrap();
        let setter = descriptors[0].setter.as_ref().unwrap();
        assert!(setter.is_fluent());
    }

    #[test]
    fn test_explicit_backing_and_attributes() {
        let catalog = RoleCatalog::new();
        catalog
            .register(
                RoleDef::new("Labelled")
                    .method(
                        MethodSig::getter("label", ValueType::collection(ValueType::Text))
                            .with_backing("http://www.w3.org/2000/01/rdf-schema#label")
                            .localized(),
                    )
                    .method(
                        MethodSig::getter("getBirthday", ValueType::Text)
                            .explicit_type("xsd:date"),
                    ),
            )
            .unwrap();
        let descriptors = resolver(catalog).resolve(&"Labelled".into()).unwrap();

        let label = &descriptors[0];
        assert_eq!(label.name, "label");
        assert_eq!(
            label.predicate.as_str(),
            "http://www.w3.org/2000/01/rdf-schema#label"
        );
        assert!(label.is_multi());
        assert!(label.is_localized());
        assert_eq!(label.element_type, ValueType::Text);

        let birthday = &descriptors[1];
        assert_eq!(birthday.explicit_type(), Some("xsd:date"));
        assert!(birthday
            .attributes
            .contains(&PropertyAttribute::ExplicitType("xsd:date".into())));
    }

    #[test]
    fn test_inherited_properties_most_specific_first() {
        let catalog = RoleCatalog::new();
        catalog
            .register(RoleDef::new("Base").method(MethodSig::getter("getName", ValueType::Text)))
            .unwrap();
        catalog
            .register(
                RoleDef::new("Derived")
                    .extends("Base")
                    .method(MethodSig::getter("getName", ValueType::Text).localized())
                    .method(MethodSig::getter("getAge", ValueType::Integer)),
            )
            .unwrap();
        let descriptors = resolver(catalog).resolve(&"Derived".into()).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert_eq!(descriptors[0].declaring_role.as_str(), "Derived");
        assert!(descriptors[0].is_localized());
    }

    #[test]
    fn test_accessor_pair_predicate_ignores_naming() {
        let role = RoleDef::new("Plain")
            .method(MethodSig::getter("title", ValueType::Text))
            .method(MethodSig::setter("title", ValueType::Text))
            .method(MethodSig::getter("summary", ValueType::Text));
        let predicate = AccessorPairPredicate::default();
        assert!(predicate.is_property(&role, &role.methods[0]));
        assert!(!predicate.is_property(&role, &role.methods[2]));
    }

    #[test]
    fn test_resolution_is_cached() {
        let catalog = RoleCatalog::new();
        catalog
            .register(RoleDef::new("R").method(MethodSig::getter("getX", ValueType::Text)))
            .unwrap();
        let resolver = resolver(catalog);
        let first = resolver.resolve(&"R".into()).unwrap();
        let second = resolver.resolve(&"R".into()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
