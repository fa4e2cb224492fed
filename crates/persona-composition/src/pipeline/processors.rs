//! Built-in method processors

use super::{MethodProcessor, SynthesisContext};
use crate::behaviour::MethodRef;
use crate::composite_type::{Dispatch, TypeBuilder};
use persona_core::{ConfigurationError, DeclaredMethod};
use std::sync::Arc;
use tracing::debug;

/// Allocates one slot per selected behaviour, in weave order
///
/// Slots carry each behaviour's per-instance state and are wired to the
/// shared entity handle when a composite is instantiated.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConstructorProcessor;

impl MethodProcessor for ConstructorProcessor {
    fn id(&self) -> &'static str {
        "constructor"
    }

    fn process(
        &self,
        ctx: &SynthesisContext<'_>,
        builder: &mut TypeBuilder,
    ) -> Result<(), ConfigurationError> {
        for def in ctx.selection.behaviours() {
            builder.add_behaviour(def.clone());
        }
        Ok(())
    }
}

/// Marks the type as playing every role of the closure and exposes each
/// role's visible methods
#[derive(Debug, Default, Clone, Copy)]
pub struct RoleMarkerProcessor;

impl MethodProcessor for RoleMarkerProcessor {
    fn id(&self) -> &'static str {
        "role-marker"
    }

    fn depends_on(&self) -> &[&'static str] {
        &["constructor"]
    }

    fn process(
        &self,
        ctx: &SynthesisContext<'_>,
        builder: &mut TypeBuilder,
    ) -> Result<(), ConfigurationError> {
        for role in ctx.closure {
            builder.add_role(role.clone());
            for declared in ctx.catalog.methods_of(role)? {
                let name = declared.sig.name.clone();
                builder.expose(
                    role.clone(),
                    name,
                    MethodRef::new(declared.role, declared.sig.name),
                );
            }
        }
        Ok(())
    }
}

/// Binds every role method a selected behaviour implements
#[derive(Debug, Default, Clone, Copy)]
pub struct BehaviourMethodProcessor;

impl MethodProcessor for BehaviourMethodProcessor {
    fn id(&self) -> &'static str {
        "behaviour-methods"
    }

    fn depends_on(&self) -> &[&'static str] {
        &["constructor", "role-marker"]
    }

    fn process(
        &self,
        ctx: &SynthesisContext<'_>,
        builder: &mut TypeBuilder,
    ) -> Result<(), ConfigurationError> {
        for declared in ctx.declared_methods()? {
            let method = MethodRef::new(declared.role, declared.sig.name);
            let Some(slot) = ctx.selection.implementer(&method)? else {
                continue;
            };
            let Some(def) = ctx.selection.behaviours().nth(slot) else {
                continue;
            };
            let Some(body) = def.methods.get(&method).cloned() else {
                continue;
            };
            builder.bind(
                method,
                Dispatch::Behaviour {
                    slot,
                    behaviour: def.name.clone(),
                    body,
                },
            );
        }
        Ok(())
    }
}

/// Generates getters and setters for properties no behaviour implements
#[derive(Debug, Default, Clone, Copy)]
pub struct PropertyAccessorProcessor;

impl MethodProcessor for PropertyAccessorProcessor {
    fn id(&self) -> &'static str {
        "property-accessors"
    }

    fn depends_on(&self) -> &[&'static str] {
        &["behaviour-methods"]
    }

    fn process(
        &self,
        ctx: &SynthesisContext<'_>,
        builder: &mut TypeBuilder,
    ) -> Result<(), ConfigurationError> {
        let declared = ctx.declared_methods()?;
        for role in ctx.closure {
            for descriptor in ctx.resolver.resolve(role)?.iter() {
                let descriptor = Arc::new(descriptor.clone());
                builder.add_property(descriptor.clone());

                let getter = MethodRef::new(descriptor.declaring_role.clone(), &descriptor.getter);
                if !builder.is_bound(&getter)
                    && !left_to_delegation(ctx, &declared, builder, &getter)
                {
                    builder.bind(
                        getter,
                        Dispatch::Getter {
                            descriptor: descriptor.clone(),
                        },
                    );
                }

                let Some(setter) = &descriptor.setter else {
                    continue;
                };
                let value_type = descriptor.value_type();
                let declaring = ctx
                    .catalog
                    .methods_of(&descriptor.declaring_role)?
                    .into_iter()
                    .find(|m| m.sig.name == setter.name && m.sig.params == [value_type.clone()]);
                if let Some(setter) = declaring {
                    let method = MethodRef::new(setter.role, setter.sig.name);
                    if !builder.is_bound(&method)
                        && !left_to_delegation(ctx, &declared, builder, &method)
                    {
                        builder.bind(
                            method,
                            Dispatch::Setter {
                                descriptor: descriptor.clone(),
                            },
                        );
                    }
                }
            }
        }
        Ok(())
    }
}

/// Whether a generated accessor for `method` must give way to delegation
///
/// That is the case when a more specific role of the closure redeclares the
/// method, so both resolve to the same property, or when a behaviour already
/// implements the same signature on an ancestor or descendant role.
fn left_to_delegation(
    ctx: &SynthesisContext<'_>,
    declared: &[DeclaredMethod],
    builder: &TypeBuilder,
    method: &MethodRef,
) -> bool {
    let Some(own) = declared
        .iter()
        .find(|d| d.role == method.role && d.sig.name == method.method)
    else {
        return false;
    };
    declared.iter().any(|other| {
        if other.role == own.role || !other.sig.same_signature(&own.sig) {
            return false;
        }
        if ctx.catalog.is_assignable(&other.role, &own.role) {
            return true;
        }
        ctx.catalog.is_assignable(&own.role, &other.role)
            && matches!(
                builder.binding(&MethodRef::new(other.role.clone(), &other.sig.name)),
                Some(Dispatch::Behaviour { .. })
            )
    })
}

/// Forwards still-unbound methods to another role's implementation
///
/// A role method nobody implements is bound to a stub that calls the
/// implementation of the same signature declared by a different role of
/// the composite, through the composite itself. Behaviour implementations
/// are preferred over generated accessors.
#[derive(Debug, Default, Clone, Copy)]
pub struct DelegationProcessor;

impl MethodProcessor for DelegationProcessor {
    fn id(&self) -> &'static str {
        "delegation"
    }

    fn depends_on(&self) -> &[&'static str] {
        &["behaviour-methods", "property-accessors"]
    }

    fn process(
        &self,
        ctx: &SynthesisContext<'_>,
        builder: &mut TypeBuilder,
    ) -> Result<(), ConfigurationError> {
        let declared = ctx.declared_methods()?;
        for method in &declared {
            let unbound = MethodRef::new(method.role.clone(), &method.sig.name);
            if builder.is_bound(&unbound) {
                continue;
            }

            let mut behaviour_target = None;
            let mut accessor_target = None;
            for other in &declared {
                if other.role == method.role || !other.sig.same_signature(&method.sig) {
                    continue;
                }
                let target = MethodRef::new(other.role.clone(), &other.sig.name);
                match builder.binding(&target) {
                    Some(Dispatch::Behaviour { .. }) if behaviour_target.is_none() => {
                        behaviour_target = Some(target);
                    }
                    Some(Dispatch::Getter { .. } | Dispatch::Setter { .. })
                        if accessor_target.is_none() =>
                    {
                        accessor_target = Some(target);
                    }
                    _ => {}
                }
            }

            if let Some(target) = behaviour_target.or(accessor_target) {
                debug!(method = %unbound, %target, "Generated delegation stub");
                builder.bind(unbound, Dispatch::Delegate { target });
            }
        }
        Ok(())
    }
}
