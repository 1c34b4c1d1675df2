//! Function model (spec §3.4, §4.G): a named mapping from integer-tuple
//! coordinates to values, optionally refined by a reduction step.

use std::collections::HashSet;
use std::rc::Rc;

use crate::core::diagnostic::LowerError;
use crate::core::ir::expr::{Expr, ExprKind, ReductionDomain};
use crate::core::schedule::Schedule;

/// Walk `e` collecting every free `Variable` name (one not introduced by an
/// inner `Let`).
fn free_variables(e: &Expr, bound: &mut Vec<String>, out: &mut HashSet<String>) {
    match &e.kind {
        ExprKind::Variable { name, .. } => {
            if !bound.contains(name) {
                out.insert(name.clone());
            }
        }
        ExprKind::IntImm(_) | ExprKind::FloatImm(_) => {}
        ExprKind::Cast { value } => free_variables(value, bound, out),
        ExprKind::Add(a, b)
        | ExprKind::Sub(a, b)
        | ExprKind::Mul(a, b)
        | ExprKind::Div(a, b)
        | ExprKind::Mod(a, b)
        | ExprKind::Min(a, b)
        | ExprKind::Max(a, b)
        | ExprKind::EQ(a, b)
        | ExprKind::NE(a, b)
        | ExprKind::LT(a, b)
        | ExprKind::LE(a, b)
        | ExprKind::GT(a, b)
        | ExprKind::GE(a, b)
        | ExprKind::And(a, b)
        | ExprKind::Or(a, b) => {
            free_variables(a, bound, out);
            free_variables(b, bound, out);
        }
        ExprKind::Not(a) => free_variables(a, bound, out),
        ExprKind::Select {
            cond,
            true_value,
            false_value,
        } => {
            free_variables(cond, bound, out);
            free_variables(true_value, bound, out);
            free_variables(false_value, bound, out);
        }
        ExprKind::Load { index, .. } => free_variables(index, bound, out),
        ExprKind::Ramp { base, stride, .. } => {
            free_variables(base, bound, out);
            free_variables(stride, bound, out);
        }
        ExprKind::Broadcast { value, .. } => free_variables(value, bound, out),
        ExprKind::Call { args, .. } => {
            for a in args {
                free_variables(a, bound, out);
            }
        }
        ExprKind::Let { name, value, body } => {
            free_variables(value, bound, out);
            bound.push(name.clone());
            free_variables(body, bound, out);
            bound.pop();
        }
    }
}

fn free_variable_set(e: &Expr) -> HashSet<String> {
    let mut out = HashSet::new();
    let mut bound = Vec::new();
    free_variables(e, &mut bound, &mut out);
    out
}

/// Is this a plain pure-argument reference (no parameter, no reduction
/// domain attached)?
fn is_pure_arg_ref(e: &Expr, name: &str) -> bool {
    matches!(&e.kind, ExprKind::Variable { name: n, param: None, reduction_domain: None } if n == name)
}

/// A named mapping from integer-tuple coordinates to values.
pub struct Function {
    pub name: String,
    pub pure_args: Vec<String>,
    pub pure_value: Option<Expr>,
    pub reduction_args: Vec<Expr>,
    pub reduction_value: Option<Expr>,
    pub reduction_domain: Option<Rc<ReductionDomain>>,
    pub pure_schedule: Schedule,
    pub reduction_schedule: Schedule,
}

impl Function {
    pub fn new(name: impl Into<String>) -> Function {
        Function {
            name: name.into(),
            pure_args: Vec::new(),
            pure_value: None,
            reduction_args: Vec::new(),
            reduction_value: None,
            reduction_domain: None,
            pure_schedule: Schedule::new(&[]),
            reduction_schedule: Schedule::new(&[]),
        }
    }

    pub fn is_reduction(&self) -> bool {
        self.reduction_value.is_some()
    }

    /// `define(args, value)` (spec §4.G): no prior pure definition; every
    /// free `Variable` in `value` is either listed in `args`, bound by a
    /// parameter, or bound by an internal `Let`.
    pub fn define(&mut self, args: Vec<String>, value: Expr) -> Result<(), LowerError> {
        if self.pure_value.is_some() {
            return Err(LowerError::ShapeMismatch {
                function: self.name.clone(),
                detail: "function already has a pure definition".into(),
            });
        }
        let free = free_variable_set(&value);
        let declared: HashSet<&str> = args.iter().map(String::as_str).collect();
        for v in &free {
            if !declared.contains(v.as_str()) && !has_param_or_rdom_binding(&value, v) {
                return Err(LowerError::ShapeMismatch {
                    function: self.name.clone(),
                    detail: format!(
                        "free variable `{}` is not a pure arg, parameter, or let binding",
                        v
                    ),
                });
            }
        }
        self.pure_args = args;
        self.pure_schedule = Schedule::new(&self.pure_args);
        self.pure_value = Some(value);
        Ok(())
    }

    /// `define_reduction(args, value)` (spec §4.G): pure definition exists;
    /// `args.len()` matches; pure args among `args` occupy the same
    /// positions as in the pure definition; all remaining free vars belong
    /// to exactly one `ReductionDomain`.
    pub fn define_reduction(&mut self, args: Vec<Expr>, value: Expr) -> Result<(), LowerError> {
        if self.pure_value.is_none() {
            return Err(LowerError::ShapeMismatch {
                function: self.name.clone(),
                detail: "reduction definition requires a prior pure definition".into(),
            });
        }
        if self.reduction_value.is_some() {
            return Err(LowerError::ShapeMismatch {
                function: self.name.clone(),
                detail: "function already has a reduction definition".into(),
            });
        }
        if args.len() != self.pure_args.len() {
            return Err(LowerError::ShapeMismatch {
                function: self.name.clone(),
                detail: format!(
                    "reduction arity {} does not match pure arity {}",
                    args.len(),
                    self.pure_args.len()
                ),
            });
        }
        for (i, (arg, pure_name)) in args.iter().zip(self.pure_args.iter()).enumerate() {
            if is_pure_arg_ref(arg, pure_name) {
                continue;
            }
            // Not a bare reference to the same-position pure arg: it must be
            // some other expression (allowed), but if it happens to name a
            // *different* pure arg, that's the position violation §4.G guards.
            if let ExprKind::Variable { name, param: None, reduction_domain: None } = &arg.kind {
                if self.pure_args.contains(name) && name != pure_name {
                    return Err(LowerError::ShapeMismatch {
                        function: self.name.clone(),
                        detail: format!(
                            "pure arg `{}` used out of position {} in reduction definition",
                            name, i
                        ),
                    });
                }
            }
        }

        let mut free = HashSet::new();
        for a in &args {
            free.extend(free_variable_set(a));
        }
        free.extend(free_variable_set(&value));

        let mut rdom: Option<Rc<ReductionDomain>> = None;
        for v in &free {
            if self.pure_args.contains(v) || has_param_or_rdom_binding(&value, v) {
                continue;
            }
            match find_reduction_domain(&args, &value, v) {
                Some(d) => {
                    if let Some(existing) = &rdom {
                        if !Rc::ptr_eq(existing, &d) {
                            return Err(LowerError::ShapeMismatch {
                                function: self.name.clone(),
                                detail: format!(
                                    "reduction variable `{}` belongs to a different ReductionDomain",
                                    v
                                ),
                            });
                        }
                    } else {
                        rdom = Some(d);
                    }
                }
                None => {
                    return Err(LowerError::ShapeMismatch {
                        function: self.name.clone(),
                        detail: format!("free variable `{}` belongs to no ReductionDomain", v),
                    });
                }
            }
        }

        self.reduction_args = args;
        self.reduction_schedule = Schedule::new(&self.pure_args);
        self.reduction_domain = rdom;
        self.reduction_value = Some(value);
        Ok(())
    }
}

fn has_param_or_rdom_binding(e: &Expr, name: &str) -> bool {
    match &e.kind {
        ExprKind::Variable {
            name: n,
            param,
            reduction_domain,
        } => n == name && (param.is_some() || reduction_domain.is_some()),
        ExprKind::Cast { value } => has_param_or_rdom_binding(value, name),
        ExprKind::Add(a, b)
        | ExprKind::Sub(a, b)
        | ExprKind::Mul(a, b)
        | ExprKind::Div(a, b)
        | ExprKind::Mod(a, b)
        | ExprKind::Min(a, b)
        | ExprKind::Max(a, b)
        | ExprKind::EQ(a, b)
        | ExprKind::NE(a, b)
        | ExprKind::LT(a, b)
        | ExprKind::LE(a, b)
        | ExprKind::GT(a, b)
        | ExprKind::GE(a, b)
        | ExprKind::And(a, b)
        | ExprKind::Or(a, b) => has_param_or_rdom_binding(a, name) || has_param_or_rdom_binding(b, name),
        ExprKind::Not(a) => has_param_or_rdom_binding(a, name),
        ExprKind::Select {
            cond,
            true_value,
            false_value,
        } => {
            has_param_or_rdom_binding(cond, name)
                || has_param_or_rdom_binding(true_value, name)
                || has_param_or_rdom_binding(false_value, name)
        }
        ExprKind::Load { index, .. } => has_param_or_rdom_binding(index, name),
        ExprKind::Ramp { base, stride, .. } => {
            has_param_or_rdom_binding(base, name) || has_param_or_rdom_binding(stride, name)
        }
        ExprKind::Broadcast { value, .. } => has_param_or_rdom_binding(value, name),
        ExprKind::Call { args, .. } => args.iter().any(|a| has_param_or_rdom_binding(a, name)),
        ExprKind::Let { body, .. } => has_param_or_rdom_binding(body, name),
        ExprKind::IntImm(_) | ExprKind::FloatImm(_) => false,
    }
}

fn find_reduction_domain(args: &[Expr], value: &Expr, name: &str) -> Option<Rc<ReductionDomain>> {
    args.iter()
        .chain(std::iter::once(value))
        .find_map(|e| find_reduction_domain_in(e, name))
}

fn find_reduction_domain_in(e: &Expr, name: &str) -> Option<Rc<ReductionDomain>> {
    match &e.kind {
        ExprKind::Variable {
            name: n,
            reduction_domain: Some(d),
            ..
        } if n == name => Some(d.clone()),
        ExprKind::Cast { value } => find_reduction_domain_in(value, name),
        ExprKind::Add(a, b)
        | ExprKind::Sub(a, b)
        | ExprKind::Mul(a, b)
        | ExprKind::Div(a, b)
        | ExprKind::Mod(a, b)
        | ExprKind::Min(a, b)
        | ExprKind::Max(a, b)
        | ExprKind::EQ(a, b)
        | ExprKind::NE(a, b)
        | ExprKind::LT(a, b)
        | ExprKind::LE(a, b)
        | ExprKind::GT(a, b)
        | ExprKind::GE(a, b)
        | ExprKind::And(a, b)
        | ExprKind::Or(a, b) => {
            find_reduction_domain_in(a, name).or_else(|| find_reduction_domain_in(b, name))
        }
        ExprKind::Not(a) => find_reduction_domain_in(a, name),
        ExprKind::Select {
            cond,
            true_value,
            false_value,
        } => find_reduction_domain_in(cond, name)
            .or_else(|| find_reduction_domain_in(true_value, name))
            .or_else(|| find_reduction_domain_in(false_value, name)),
        ExprKind::Load { index, .. } => find_reduction_domain_in(index, name),
        ExprKind::Ramp { base, stride, .. } => {
            find_reduction_domain_in(base, name).or_else(|| find_reduction_domain_in(stride, name))
        }
        ExprKind::Broadcast { value, .. } => find_reduction_domain_in(value, name),
        ExprKind::Call { args, .. } => args.iter().find_map(|a| find_reduction_domain_in(a, name)),
        ExprKind::Let { body, .. } => find_reduction_domain_in(body, name),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ir::expr::*;
    use crate::core::types::Type;

    #[test]
    fn define_rejects_unbound_free_variable() {
        let mut f = Function::new("g");
        let x = variable("x", Type::int(32, 1));
        let y = variable("y", Type::int(32, 1));
        let err = f.define(vec!["x".into()], add(x, y));
        assert!(matches!(err, Err(LowerError::ShapeMismatch { .. })));
    }

    #[test]
    fn define_accepts_fully_bound_value() {
        let mut f = Function::new("g");
        let x = variable("x", Type::int(32, 1));
        let y = variable("y", Type::int(32, 1));
        f.define(vec!["x".into(), "y".into()], add(x, y)).unwrap();
        assert_eq!(f.pure_args, vec!["x", "y"]);
    }

    #[test]
    fn define_reduction_requires_prior_pure_definition() {
        let mut f = Function::new("g");
        let x = variable("x", Type::int(32, 1));
        let err = f.define_reduction(vec![x.clone()], x);
        assert!(matches!(err, Err(LowerError::ShapeMismatch { .. })));
    }

    #[test]
    fn define_reduction_requires_matching_arity() {
        let mut f = Function::new("g");
        let x = variable("x", Type::int(32, 1));
        let y = variable("y", Type::int(32, 1));
        f.define(vec!["x".into(), "y".into()], add(x.clone(), y.clone()))
            .unwrap();
        let err = f.define_reduction(vec![x], int32(0));
        assert!(matches!(err, Err(LowerError::ShapeMismatch { .. })));
    }

    #[test]
    fn define_reduction_accepts_rdom_variable() {
        let mut f = Function::new("g");
        let x = variable("x", Type::int(32, 1));
        f.define(vec!["x".into()], x.clone()).unwrap();

        let rdom = Rc::new(ReductionDomain {
            name: "r".into(),
            bounds: vec![("r.x".into(), int32(0), int32(10))],
        });
        let r = reduction_variable("r.x", Type::int(32, 1), rdom);
        f.define_reduction(vec![r.clone()], add(r, int32(1))).unwrap();
        assert!(f.is_reduction());
    }
}
