use std::cell::Cell;
use std::rc::{Rc, Weak};

use pretty_assertions::assert_eq;

use super::*;
use crate::dispatch;

fn kw(name: &str) -> Tag {
    Tag::keyword(name)
}

fn derive(h: &HierarchyRef, tag: &str, parent: &str) {
    h.try_swap(|current| current.derive(kw(tag), kw(parent)))
        .unwrap();
}

fn underive(h: &HierarchyRef, tag: &str, parent: &str) {
    h.swap(|current| current.underive(&kw(tag), &kw(parent)))
        .unwrap();
}

/// A multimethod on the first argument whose methods return their own key.
fn speak(h: &HierarchyRef, keys: &[&str]) -> MultiFn {
    let mf = MultiFn::builder("speak", dispatch::first_arg)
        .hierarchy(Rc::clone(h))
        .build();
    for key in keys {
        let out = Value::str(key);
        mf.add_method(kw(key), move |_| Ok(out.clone()));
    }
    mf
}

fn call(mf: &MultiFn, arg: &str) -> DispatchResult<String> {
    let out = mf.invoke(&[Value::keyword(arg)])?;
    Ok(out.as_str().unwrap_or_default().to_string())
}

/// :dog -> :mammal, :dog -> :pet
fn two_parents() -> HierarchyRef {
    let h = new_hierarchy_ref();
    derive(&h, "dog", "mammal");
    derive(&h, "dog", "pet");
    h
}

// ==================== dispatch ====================

#[test]
fn test_exact_match() {
    let h = new_hierarchy_ref();
    let mf = speak(&h, &["dog", "cat"]);
    assert_eq!(call(&mf, "dog").unwrap(), "dog");
    assert_eq!(call(&mf, "cat").unwrap(), "cat");
}

#[test]
fn test_isa_match_picks_most_specific() {
    let h = new_hierarchy_ref();
    derive(&h, "mammal", "animal");
    derive(&h, "dog", "mammal");
    let mf = speak(&h, &["animal", "mammal"]);
    assert_eq!(call(&mf, "dog").unwrap(), "mammal");
    assert_eq!(call(&mf, "mammal").unwrap(), "mammal");
}

#[test]
fn test_no_matching_method() {
    let h = new_hierarchy_ref();
    let mf = speak(&h, &["cat"]);
    let err = call(&mf, "dog").unwrap_err();
    assert_eq!(
        err,
        DispatchError::NoMatchingMethod {
            name: "speak".to_string(),
            value: kw("dog")
        }
    );
    insta::assert_snapshot!(err, @"No method in multimethod 'speak' for dispatch value: :dog");
}

#[test]
fn test_default_method() {
    let h = new_hierarchy_ref();
    let mf = speak(&h, &["cat", "default"]);
    assert_eq!(call(&mf, "dog").unwrap(), "default");
    assert_eq!(call(&mf, "cat").unwrap(), "cat");
}

#[test]
fn test_custom_default_dispatch_value() {
    let mf = MultiFn::builder("area", dispatch::first_arg)
        .default_dispatch_value(kw("fallback"))
        .build();
    mf.add_method(kw("fallback"), |_| Ok(Value::Int(0)));
    mf.add_method(kw("default"), |_| Ok(Value::Int(-1)));
    let out = mf.invoke(&[Value::keyword("circle")]).unwrap();
    assert_eq!(out.as_int(), Some(0));
    assert_eq!(mf.default_dispatch_value(), &kw("fallback"));
}

#[test]
fn test_dispatch_fn_error_propagates() {
    let mf = MultiFn::builder("first", dispatch::first_arg).build();
    mf.add_method(kw("default"), |_| Ok(Value::Nil));
    assert!(matches!(
        mf.invoke(&[]),
        Err(DispatchError::Arity { got: 0, .. })
    ));
}

#[test]
fn test_method_receives_all_args() {
    let mf = MultiFn::builder("add", dispatch::first_arg).build();
    mf.add_method(kw("sum"), |args| {
        Ok(Value::Int(args[1..].iter().filter_map(Value::as_int).sum()))
    });
    let out = mf
        .invoke(&[Value::keyword("sum"), Value::Int(2), Value::Int(3)])
        .unwrap();
    assert_eq!(out.as_int(), Some(5));
}

#[test]
fn test_vector_dispatch() {
    let h = new_hierarchy_ref();
    derive(&h, "dog", "animal");
    derive(&h, "cat", "animal");
    let meet = MultiFn::builder("meet", dispatch::args_vector)
        .hierarchy(Rc::clone(&h))
        .build();
    meet.add_method(Tag::vector([kw("dog"), kw("cat")]), |_| Ok(Value::str("chase")));
    meet.add_method(Tag::vector([kw("animal"), kw("animal")]), |_| Ok(Value::str("sniff")));

    let chase = meet
        .invoke(&[Value::keyword("dog"), Value::keyword("cat")])
        .unwrap();
    assert_eq!(chase.as_str(), Some("chase"));
    let sniff = meet
        .invoke(&[Value::keyword("cat"), Value::keyword("dog")])
        .unwrap();
    assert_eq!(sniff.as_str(), Some("sniff"));
}

#[test]
fn test_type_dispatch() {
    let h = new_hierarchy_ref();
    h.try_swap(|current| current.derive(Tag::symbol("Int"), Tag::symbol("Number")))
        .unwrap();
    let describe = MultiFn::builder("describe", dispatch::type_of)
        .hierarchy(Rc::clone(&h))
        .build();
    describe.add_method(Tag::symbol("Number"), |_| Ok(Value::str("number")));
    describe.add_method(Tag::default_dispatch(), |_| Ok(Value::str("other")));

    let n = describe.invoke(&[Value::Int(7)]).unwrap();
    assert_eq!(n.as_str(), Some("number"));
    let s = describe.invoke(&[Value::str("x")]).unwrap();
    assert_eq!(s.as_str(), Some("other"));
}

#[test]
fn test_recursive_method() {
    let fact = Rc::new_cyclic(|this: &Weak<MultiFn>| {
        let mf = MultiFn::builder("fact", |args: &[Value]| {
            let n = args.first().and_then(Value::as_int).unwrap_or_default();
            Ok(if n <= 1 { kw("base") } else { kw("step") })
        })
        .build();
        mf.add_method(kw("base"), |_| Ok(Value::Int(1)));
        let this = this.clone();
        mf.add_method(kw("step"), move |args| {
            let n = args[0].as_int().unwrap_or_default();
            let Some(me) = this.upgrade() else {
                return Err(DispatchError::custom("fact dropped"));
            };
            let rest = me.invoke(&[Value::Int(n - 1)])?;
            Ok(Value::Int(n * rest.as_int().unwrap_or_default()))
        });
        mf
    });
    assert_eq!(fact.invoke(&[Value::Int(5)]).unwrap().as_int(), Some(120));
}

// ==================== ambiguity and preference ====================

#[test]
fn test_ambiguous_dispatch() {
    let h = two_parents();
    let mf = speak(&h, &["mammal", "pet"]);
    let err = call(&mf, "dog").unwrap_err();
    assert!(matches!(err, DispatchError::AmbiguousDispatch { .. }));
    insta::assert_snapshot!(
        err,
        @"Multiple methods in multimethod 'speak' match dispatch value: :dog -> :pet and :mammal, and neither is preferred"
    );
}

#[test]
fn test_ambiguity_does_not_fall_back_to_default() {
    let h = two_parents();
    let mf = speak(&h, &["mammal", "pet", "default"]);
    assert!(matches!(
        call(&mf, "dog"),
        Err(DispatchError::AmbiguousDispatch { .. })
    ));
}

#[test]
fn test_prefer_method_resolves_ambiguity() {
    let h = two_parents();
    let mf = speak(&h, &["mammal", "pet"]);
    mf.prefer_method(kw("pet"), kw("mammal")).unwrap();
    assert_eq!(call(&mf, "dog").unwrap(), "pet");
    assert_eq!(
        mf.prefers().get(&kw("pet")).map(|over| over.contains(&kw("mammal"))),
        Some(true)
    );
}

#[test]
fn test_conflicting_preference() {
    let h = two_parents();
    let mf = speak(&h, &["mammal", "pet"]);
    mf.prefer_method(kw("pet"), kw("mammal")).unwrap();
    let err = mf.prefer_method(kw("mammal"), kw("pet")).unwrap_err();
    assert_eq!(
        err,
        DispatchError::ConflictingPreference {
            name: "speak".to_string(),
            preferred: kw("mammal"),
            other: kw("pet")
        }
    );
    // Table unchanged
    assert!(!mf.prefers().contains_key(&kw("mammal")));
    assert_eq!(call(&mf, "dog").unwrap(), "pet");
}

#[test]
fn test_preference_inherited_through_parents() {
    let h = two_parents();
    derive(&h, "pet", "domestic");
    derive(&h, "mammal", "warm");
    let mf = speak(&h, &["mammal", "pet"]);

    // :mammal is preferred over a parent of :pet
    mf.prefer_method(kw("mammal"), kw("domestic")).unwrap();
    assert_eq!(call(&mf, "dog").unwrap(), "mammal");

    // A parent of :pet preferred over :mammal conflicts with that
    assert!(matches!(
        mf.prefer_method(kw("domestic"), kw("mammal")),
        Err(DispatchError::ConflictingPreference { .. })
    ));

    let other = speak(&h, &["mammal", "pet"]);
    // A parent of :pet is preferred over :mammal
    other.prefer_method(kw("domestic"), kw("mammal")).unwrap();
    assert_eq!(call(&other, "dog").unwrap(), "pet");
}

/// `{p}0` -> (`{p}l0`, `{p}r0`) -> `{p}1` -> ... -> `{p}{depth}`: every level
/// doubles the number of parent paths to the top.
fn diamond_ladder(h: &HierarchyRef, p: &str, depth: usize) {
    for i in 0..depth {
        let (node, next) = (format!("{}{}", p, i), format!("{}{}", p, i + 1));
        let (left, right) = (format!("{}l{}", p, i), format!("{}r{}", p, i));
        derive(h, &node, &left);
        derive(h, &node, &right);
        derive(h, &left, &next);
        derive(h, &right, &next);
    }
}

#[test]
fn test_preference_through_deep_shared_ancestry() {
    let h = new_hierarchy_ref();
    diamond_ladder(&h, "a", 40);
    diamond_ladder(&h, "b", 40);
    derive(&h, "x", "a0");
    derive(&h, "x", "b0");
    let mf = speak(&h, &["a0", "b0"]);
    assert!(matches!(
        call(&mf, "x"),
        Err(DispatchError::AmbiguousDispatch { .. })
    ));

    mf.prefer_method(kw("b40"), kw("a40")).unwrap();
    assert_eq!(call(&mf, "x").unwrap(), "b0");
    assert!(matches!(
        mf.prefer_method(kw("a0"), kw("b0")),
        Err(DispatchError::ConflictingPreference { .. })
    ));
}

// ==================== cache coherency ====================

#[test]
fn test_hierarchy_change_invalidates_cache() {
    let h = new_hierarchy_ref();
    let mf = speak(&h, &["animal"]);
    assert!(matches!(
        call(&mf, "dog"),
        Err(DispatchError::NoMatchingMethod { .. })
    ));

    derive(&h, "dog", "animal");
    assert_eq!(call(&mf, "dog").unwrap(), "animal");

    underive(&h, "dog", "animal");
    assert!(matches!(
        call(&mf, "dog"),
        Err(DispatchError::NoMatchingMethod { .. })
    ));
}

#[test]
fn test_cached_result_replaced_by_more_specific() {
    let h = new_hierarchy_ref();
    derive(&h, "dog", "animal");
    derive(&h, "mammal", "animal");
    let mf = speak(&h, &["animal", "mammal"]);
    assert_eq!(call(&mf, "dog").unwrap(), "animal");

    derive(&h, "dog", "mammal");
    assert_eq!(call(&mf, "dog").unwrap(), "mammal");
}

#[test]
fn test_cache_reseeded_on_method_change() {
    let h = new_hierarchy_ref();
    derive(&h, "dog", "animal");
    let mf = speak(&h, &["animal"]);
    assert_eq!(mf.cache_len(), 1);
    assert_eq!(call(&mf, "dog").unwrap(), "animal");
    assert_eq!(mf.cache_len(), 2);

    mf.add_method(kw("dog"), |_| Ok(Value::str("woof")));
    assert_eq!(mf.cache_len(), 2);
    assert_eq!(call(&mf, "dog").unwrap(), "woof");
}

#[test]
fn test_unrelated_hierarchy_update_resets_cache() {
    let h = new_hierarchy_ref();
    derive(&h, "dog", "animal");
    let mf = speak(&h, &["animal"]);
    call(&mf, "dog").unwrap();
    assert_eq!(mf.cache_len(), 2);

    derive(&h, "rock", "mineral");
    assert_eq!(call(&mf, "animal").unwrap(), "animal");
    assert_eq!(mf.cache_len(), 1);
}

#[test]
fn test_method_may_update_hierarchy() {
    let h = new_hierarchy_ref();
    derive(&h, "dog", "animal");
    let mf = speak(&h, &["cat"]);
    let cell = Rc::clone(&h);
    let calls = Rc::new(Cell::new(0));
    let seen = Rc::clone(&calls);
    mf.add_method(kw("animal"), move |_| {
        seen.set(seen.get() + 1);
        cell.try_swap(|current| current.derive(kw("cat"), kw("animal")))?;
        Ok(Value::Nil)
    });
    mf.invoke(&[Value::keyword("dog")]).unwrap();
    assert_eq!(calls.get(), 1);
    assert!(h.with(|current| current.isa(&kw("cat"), &kw("animal"))));
    assert_eq!(call(&mf, "cat").unwrap(), "cat");
}

// ==================== table management ====================

#[test]
fn test_remove_method_falls_back() {
    let h = new_hierarchy_ref();
    derive(&h, "dog", "animal");
    let mf = speak(&h, &["animal", "dog"]);
    assert_eq!(call(&mf, "dog").unwrap(), "dog");

    assert!(mf.remove_method(&kw("dog")));
    assert!(!mf.remove_method(&kw("dog")));
    assert_eq!(call(&mf, "dog").unwrap(), "animal");

    assert!(mf.remove_method(&kw("animal")));
    assert!(matches!(
        call(&mf, "dog"),
        Err(DispatchError::NoMatchingMethod { .. })
    ));
}

#[test]
fn test_add_method_replaces() {
    let mf = speak(&new_hierarchy_ref(), &["dog"]);
    mf.add_method(kw("dog"), |_| Ok(Value::str("woof")));
    assert_eq!(call(&mf, "dog").unwrap(), "woof");
    assert_eq!(mf.methods().len(), 1);
}

#[test]
fn test_reset_clears_everything() {
    let h = two_parents();
    let mf = speak(&h, &["mammal", "pet", "default"]);
    mf.prefer_method(kw("pet"), kw("mammal")).unwrap();
    mf.reset();
    assert!(mf.methods().is_empty());
    assert!(mf.prefers().is_empty());
    assert_eq!(mf.cache_len(), 0);
    assert!(matches!(
        call(&mf, "dog"),
        Err(DispatchError::NoMatchingMethod { .. })
    ));

    mf.add_method(kw("pet"), |_| Ok(Value::str("pet")));
    mf.remove_all_methods();
    assert!(mf.methods().is_empty());
}

#[test]
fn test_get_method() {
    let h = two_parents();
    let mf = speak(&h, &["pet"]);
    assert!(mf.get_method(&kw("dog")).unwrap().is_some());
    assert!(mf.get_method(&kw("cat")).unwrap().is_none());

    mf.add_method(kw("default"), |_| Ok(Value::Nil));
    let fallback = mf.get_method(&kw("cat")).unwrap().unwrap();
    let default = mf.methods()[&kw("default")].clone();
    assert!(Rc::ptr_eq(&fallback, &default));
}

#[test]
fn test_accessors_and_debug() {
    let h = new_hierarchy_ref();
    let mf = speak(&h, &[]);
    assert_eq!(mf.name(), "speak");
    assert!(Rc::ptr_eq(mf.hierarchy(), &h));
    assert_eq!(mf.default_dispatch_value(), &Tag::default_dispatch());
    assert_eq!(
        (mf.dispatch_fn())(&[Value::keyword("x")]).unwrap(),
        kw("x")
    );
    assert_eq!(format!("{:?}", mf), "#<MultiFn speak>");
}

#[test]
fn test_builder_without_hierarchy_is_private() {
    let a = MultiFn::builder("a", dispatch::first_arg).build();
    let b = MultiFn::builder("b", dispatch::first_arg).build();
    assert!(!Rc::ptr_eq(a.hierarchy(), b.hierarchy()));
    assert!(a.hierarchy().with(|h| h.is_empty()));
}

#[test]
fn test_new_matches_builder() {
    let h = new_hierarchy_ref();
    derive(&h, "dog", "animal");
    let mf = MultiFn::new("speak", dispatch::first_arg, kw("other"), Rc::clone(&h));
    mf.add_method(kw("animal"), |_| Ok(Value::str("animal")));
    mf.add_method(kw("other"), |_| Ok(Value::str("other")));
    assert_eq!(call(&mf, "dog").unwrap(), "animal");
    assert_eq!(call(&mf, "rock").unwrap(), "other");
}
