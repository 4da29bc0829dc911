use super::*;
use crate::{
    AttributeDef, CategoryId, DiagnosticKind, EffectBehavior, EffectCategory, EffectDef, GroupId,
    Journal, Modifier, Operator, SkillRef, TargetFilter, TypeDef, CATEGORY_SHIP, CATEGORY_SKILL,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

const MODULE: CategoryId = CategoryId(7);

const SPEED: AttrId = AttrId(37);
const SPEED_BONUS: AttrId = AttrId(20);
const SKILL_BONUS: AttrId = AttrId(292);
const RANGE: AttrId = AttrId(54);
const RANGE_BONUS: AttrId = AttrId(351);
const DAMAGE: AttrId = AttrId(64);
const CHARGE_DAMAGE: AttrId = AttrId(114);
const SHIELD: AttrId = AttrId(264);
const SHIELD_CAPACITY: AttrId = AttrId(263);
const SHIELD_BONUS: AttrId = AttrId(337);

const SHIP: TypeId = TypeId(1);
const SKILL: TypeId = TypeId(3300);

const SPEED_FX: EffectId = EffectId(1);
const SKILL_FX: EffectId = EffectId(2);

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {expected}, got {actual}"
    );
}

fn base_catalog() -> Catalog {
    Catalog::new()
        .with_attribute(AttributeDef::new(SPEED).stackable(false))
        .with_attribute(AttributeDef::new(SPEED_BONUS))
        .with_attribute(AttributeDef::new(SKILL_BONUS))
        .with_attribute(AttributeDef::new(RANGE).stackable(false))
        .with_attribute(AttributeDef::new(RANGE_BONUS))
        .with_attribute(AttributeDef::new(DAMAGE))
        .with_attribute(AttributeDef::new(CHARGE_DAMAGE))
        .with_attribute(AttributeDef::new(SHIELD).with_max_attribute(SHIELD_CAPACITY))
        .with_attribute(AttributeDef::new(SHIELD_CAPACITY))
        .with_attribute(AttributeDef::new(SHIELD_BONUS))
        .with_effect(
            EffectDef::new(SPEED_FX, EffectCategory::Passive).with_modifier(Modifier::item(
                Domain::Ship,
                SPEED,
                Operator::PostPercent,
                SPEED_BONUS,
            )),
        )
        .with_effect(
            EffectDef::new(SKILL_FX, EffectCategory::Passive).with_modifier(Modifier::filtered(
                TargetFilter::DomainSkillrq(SkillRef::SelfType),
                Domain::Ship,
                SPEED_BONUS,
                Operator::PostPercent,
                SKILL_BONUS,
            )),
        )
        .with_type(
            TypeDef::new(SHIP, GroupId(25), CATEGORY_SHIP)
                .with_attr(SPEED, 100.0)
                .with_attr(SHIELD, 500.0)
                .with_attr(SHIELD_CAPACITY, 300.0),
        )
        .with_type(
            TypeDef::new(SKILL, GroupId(255), CATEGORY_SKILL)
                .with_attr(SKILL_BONUS, 10.0)
                .with_effect(SKILL_FX),
        )
}

/// Module type boosting ship speed by `bonus` percent
fn speed_module(id: u32, bonus: Option<f64>) -> TypeDef {
    let def = TypeDef::new(TypeId(id), GroupId(764), MODULE)
        .with_effect(SPEED_FX)
        .with_skill(SKILL, 1);
    match bonus {
        Some(bonus) => def.with_attr(SPEED_BONUS, bonus),
        None => def,
    }
}

fn fit_with(catalog: Catalog) -> Fit {
    Fit::new(Arc::new(catalog))
}

#[test]
fn test_source_added_and_removed() {
    let mut fit = fit_with(base_catalog().with_type(speed_module(100, Some(50.0))));
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    assert_close(fit.attr(ship, SPEED).unwrap(), 100.0);

    let module = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();
    assert_close(fit.attr(ship, SPEED).unwrap(), 150.0);

    fit.remove_item(module).unwrap();
    assert_close(fit.attr(ship, SPEED).unwrap(), 100.0);
}

#[test]
fn test_ship_added_after_modules() {
    let mut fit = fit_with(base_catalog().with_type(speed_module(100, Some(50.0))));
    fit.add_item(ItemKind::Module, TypeId(100)).unwrap();
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    assert_close(fit.attr(ship, SPEED).unwrap(), 150.0);
}

#[test]
fn test_cached_value_is_not_recomputed() {
    let mut fit = fit_with(base_catalog().with_type(speed_module(100, Some(50.0))));
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    let module = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();

    let calls = Rc::new(Cell::new(0));
    let counter = calls.clone();
    fit.set_override(module, SPEED_BONUS, move || {
        counter.set(counter.get() + 1);
        20.0
    })
    .unwrap();

    assert_close(fit.attr(ship, SPEED).unwrap(), 120.0);
    assert_close(fit.attr(ship, SPEED).unwrap(), 120.0);
    assert_eq!(calls.get(), 1);

    fit.invalidate(ship, SPEED).unwrap();
    assert_close(fit.attr(ship, SPEED).unwrap(), 120.0);
    assert_eq!(calls.get(), 2);
}

#[test]
fn test_chain_through_three_items() {
    let mut fit = fit_with(base_catalog().with_type(speed_module(100, Some(50.0))));
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    let module = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();
    let skill = fit.add_item(ItemKind::Skill, SKILL).unwrap();

    // skill +10% on module bonus, module +55% on ship
    assert_close(fit.attr(module, SPEED_BONUS).unwrap(), 55.0);
    assert_close(fit.attr(ship, SPEED).unwrap(), 155.0);

    fit.set_override(skill, SKILL_BONUS, || 20.0).unwrap();
    assert_close(fit.attr(ship, SPEED).unwrap(), 160.0);

    fit.remove_item(skill).unwrap();
    assert_close(fit.attr(module, SPEED_BONUS).unwrap(), 50.0);
    assert_close(fit.attr(ship, SPEED).unwrap(), 150.0);
}

fn penalty_catalog(category: CategoryId, stackable: bool) -> Catalog {
    let mut catalog = base_catalog();
    catalog.insert_attribute(AttributeDef::new(SPEED).stackable(stackable));
    for (i, bonus) in [20.0, 50.0, -90.0, -25.0, 400.0].into_iter().enumerate() {
        let mut def = speed_module(100 + i as u32, Some(bonus));
        def.category_id = category;
        catalog.insert_type(def);
    }
    catalog
}

fn fit_five_sources(catalog: Catalog, kind: ItemKind) -> (Fit, ItemId) {
    let mut fit = fit_with(catalog);
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    for i in 0..5 {
        fit.add_item(kind, TypeId(100 + i)).unwrap();
    }
    (fit, ship)
}

#[test]
fn test_stacking_penalty() {
    let (mut fit, ship) = fit_five_sources(penalty_catalog(MODULE, false), ItemKind::Module);
    let value = fit.attr(ship, SPEED).unwrap();
    assert_eq!((value * 1000.0).round() / 1000.0, 62.55);
}

#[test]
fn test_stackable_attribute_is_not_penalized() {
    let (mut fit, ship) = fit_five_sources(penalty_catalog(MODULE, true), ItemKind::Module);
    assert_close(fit.attr(ship, SPEED).unwrap(), 67.5);
}

#[test]
fn test_immune_source_category_is_not_penalized() {
    let (mut fit, ship) = fit_five_sources(penalty_catalog(CATEGORY_SKILL, false), ItemKind::Implant);
    assert_close(fit.attr(ship, SPEED).unwrap(), 67.5);

    let mut fit = Fit::with_config(
        Arc::new(penalty_catalog(CATEGORY_SKILL, false)),
        EngineConfig::without_immunity(),
    );
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    for i in 0..5 {
        fit.add_item(ItemKind::Implant, TypeId(100 + i)).unwrap();
    }
    let value = fit.attr(ship, SPEED).unwrap();
    assert_eq!((value * 1000.0).round() / 1000.0, 62.55);
}

#[test]
fn test_missing_source_value_is_skipped() {
    let catalog = base_catalog()
        .with_type(speed_module(100, Some(50.0)))
        .with_type(speed_module(101, None));
    let mut fit = fit_with(catalog);
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    fit.add_item(ItemKind::Module, TypeId(100)).unwrap();
    let broken = fit.add_item(ItemKind::Module, TypeId(101)).unwrap();

    assert_close(fit.attr(ship, SPEED).unwrap(), 150.0);
    let missing: Vec<_> = fit
        .diagnostics()
        .filter(|d| d.kind == DiagnosticKind::MissingBaseValue)
        .collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].item, broken);
    assert_eq!(missing[0].attr, SPEED_BONUS);

    // A direct read reports the error
    assert_eq!(
        fit.attr(broken, SPEED_BONUS),
        Err(Error::MissingBaseValue {
            item: broken,
            type_id: TypeId(101),
            attr: SPEED_BONUS,
        })
    );
}

const A2: AttrId = AttrId(2);
const A3: AttrId = AttrId(3);
const A4: AttrId = AttrId(4);

fn override_fit() -> (Fit, ItemId) {
    let catalog = Catalog::new()
        .with_attribute(AttributeDef::new(A2))
        .with_attribute(AttributeDef::new(A3))
        .with_attribute(AttributeDef::new(A4))
        .with_effect(
            EffectDef::new(EffectId(1), EffectCategory::Passive)
                .with_modifier(Modifier::item(Domain::SelfItem, A3, Operator::PostPercent, A2))
                .with_modifier(Modifier::item(Domain::SelfItem, A4, Operator::PostPercent, A3)),
        )
        .with_type(
            TypeDef::new(TypeId(1), GroupId(1), MODULE)
                .with_attr(A2, 100.0)
                .with_attr(A3, 5.0)
                .with_attr(A4, 50.0)
                .with_effect(EffectId(1)),
        );
    let mut fit = fit_with(catalog);
    let item = fit.add_item(ItemKind::Module, TypeId(1)).unwrap();
    (fit, item)
}

#[test]
fn test_override_replaces_value_for_dependents() {
    let (mut fit, item) = override_fit();
    assert_close(fit.attr(item, A4).unwrap(), 55.0);

    let value = Rc::new(Cell::new(77.0));
    let produced = value.clone();
    fit.set_override(item, A3, move || produced.get()).unwrap();
    assert_close(fit.attr(item, A3).unwrap(), 77.0);
    assert_close(fit.attr(item, A4).unwrap(), 88.5);
    assert_close(fit.attr_without_override(item, A3).unwrap(), 10.0);

    // Not seen until notified
    value.set(88.0);
    assert_close(fit.attr(item, A4).unwrap(), 88.5);
    fit.notify_override_may_have_changed(item, A3).unwrap();
    assert_close(fit.attr(item, A4).unwrap(), 94.0);

    assert!(fit.clear_override(item, A3).unwrap());
    assert!(!fit.clear_override(item, A3).unwrap());
    assert_close(fit.attr(item, A3).unwrap(), 10.0);
    assert_close(fit.attr(item, A4).unwrap(), 55.0);
}

#[test]
fn test_override_messages() {
    let (mut fit, item) = override_fit();
    let journal = Rc::new(RefCell::new(Journal::new()));
    fit.subscribe(Box::new(journal.clone()));
    fit.attr(item, A4).unwrap();

    fit.set_override(item, A3, || 77.0).unwrap();
    assert!(journal
        .borrow()
        .messages()
        .any(|m| *m == Msg::attr_changed(item, A3)));
    fit.attr(item, A4).unwrap();

    journal.borrow_mut().clear();
    fit.invalidate(item, A2).unwrap();
    let seen: Vec<Msg> = journal.borrow().messages().copied().collect();
    assert_eq!(
        seen,
        vec![
            Msg::attr_changed_masked(item, A3),
            Msg::attr_changed(item, A2),
        ]
    );
    // The value computed from the override survives
    assert!(fit.item(item).unwrap().attrs().is_cached(A4));
}

#[test]
fn test_failing_override_propagates() {
    let (mut fit, item) = override_fit();
    fit.set_fallible_override(item, A3, || Err("no data".to_string()))
        .unwrap();
    let err = fit.attr(item, A4).unwrap_err();
    assert_eq!(
        err,
        Error::OverrideRaised {
            item,
            attr: A3,
            reason: "no data".to_string(),
        }
    );
    // The computed value is still reachable
    assert_close(fit.attr_without_override(item, A3).unwrap(), 10.0);
}

#[test]
fn test_state_gates_modifiers() {
    let catalog = base_catalog()
        .with_effect(
            EffectDef::new(EffectId(50), EffectCategory::Active).with_modifier(
                Modifier::item(Domain::Ship, SPEED, Operator::PostPercent, SPEED_BONUS)
                    .with_state(State::Active),
            ),
        )
        .with_type(
            TypeDef::new(TypeId(100), GroupId(46), MODULE)
                .with_attr(SPEED_BONUS, 100.0)
                .with_default_effect(EffectId(50)),
        );
    let mut fit = fit_with(catalog);
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    let module = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();
    assert_close(fit.attr(ship, SPEED).unwrap(), 100.0);

    fit.set_state(module, State::Online).unwrap();
    assert_close(fit.attr(ship, SPEED).unwrap(), 100.0);
    fit.set_state(module, State::Overload).unwrap();
    assert_close(fit.attr(ship, SPEED).unwrap(), 200.0);
    fit.set_state(module, State::Offline).unwrap();
    assert_close(fit.attr(ship, SPEED).unwrap(), 100.0);
}

fn range_catalog() -> Catalog {
    base_catalog()
        .with_effect(
            EffectDef::new(EffectId(60), EffectCategory::Passive).with_modifier(Modifier::filtered(
                TargetFilter::DomainGroup(GroupId(35)),
                Domain::Ship,
                RANGE,
                Operator::PostPercent,
                RANGE_BONUS,
            )),
        )
        .with_effect(
            EffectDef::new(EffectId(61), EffectCategory::Passive).with_modifier(Modifier::filtered(
                TargetFilter::Domain,
                Domain::SelfItem,
                RANGE,
                Operator::ModAdd,
                RANGE_BONUS,
            )),
        )
        .with_type(
            TypeDef::new(TypeId(3301), GroupId(255), CATEGORY_SKILL)
                .with_attr(RANGE_BONUS, 10.0)
                .with_effect(EffectId(60)),
        )
        .with_type(
            TypeDef::new(TypeId(2), GroupId(26), CATEGORY_SHIP)
                .with_attr(RANGE_BONUS, 500.0)
                .with_effect(EffectId(61)),
        )
        .with_type(TypeDef::new(TypeId(100), GroupId(35), MODULE).with_attr(RANGE, 1000.0))
        .with_type(TypeDef::new(TypeId(101), GroupId(53), MODULE).with_attr(RANGE, 1000.0))
}

#[test]
fn test_domain_group_filter() {
    let mut fit = fit_with(range_catalog());
    let matching = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();
    let other = fit.add_item(ItemKind::Module, TypeId(101)).unwrap();
    fit.add_item(ItemKind::Skill, TypeId(3301)).unwrap();

    assert_close(fit.attr(matching, RANGE).unwrap(), 1100.0);
    assert_close(fit.attr(other, RANGE).unwrap(), 1000.0);
}

#[test]
fn test_domain_filter_follows_placement() {
    let mut fit = fit_with(range_catalog());
    let ship = fit.add_item(ItemKind::Ship, TypeId(2)).unwrap();
    let module = fit.add_item(ItemKind::Module, TypeId(101)).unwrap();
    assert_close(fit.attr(module, RANGE).unwrap(), 1500.0);

    fit.set_domain(module, Some(Domain::Character)).unwrap();
    assert_close(fit.attr(module, RANGE).unwrap(), 1000.0);
    fit.set_domain(module, Some(Domain::Ship)).unwrap();
    assert_close(fit.attr(module, RANGE).unwrap(), 1500.0);

    // The ship is not inside its own domain
    assert_eq!(fit.registry().affectors(ship, RANGE).len(), 0);
    assert_eq!(
        fit.set_domain(ship, Some(Domain::Character)),
        Err(Error::InvalidPlacement {
            item: ship,
            domain: Domain::Character,
        })
    );
    assert_eq!(
        fit.set_domain(module, Some(Domain::Target)),
        Err(Error::InvalidPlacement {
            item: module,
            domain: Domain::Target,
        })
    );
}

fn charge_catalog() -> Catalog {
    base_catalog()
        .with_effect(
            EffectDef::new(EffectId(70), EffectCategory::Passive).with_modifier(Modifier::item(
                Domain::Other,
                DAMAGE,
                Operator::ModAdd,
                CHARGE_DAMAGE,
            )),
        )
        .with_effect(
            EffectDef::new(EffectId(71), EffectCategory::Target).with_modifier(
                Modifier::item(Domain::Target, DAMAGE, Operator::ModAdd, DAMAGE)
                    .with_state(State::Active),
            ),
        )
        .with_type(
            TypeDef::new(TypeId(100), GroupId(53), MODULE)
                .with_attr(DAMAGE, 10.0)
                .with_default_effect(EffectId(71)),
        )
        .with_type(
            TypeDef::new(TypeId(200), GroupId(85), CategoryId(8))
                .with_attr(CHARGE_DAMAGE, 5.0)
                .with_effect(EffectId(70)),
        )
}

#[test]
fn test_charge_modifies_module_through_other() {
    let mut fit = fit_with(charge_catalog());
    let module = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();
    assert_close(fit.attr(module, DAMAGE).unwrap(), 10.0);

    let charge = fit.load_charge(module, TypeId(200)).unwrap();
    assert_eq!(fit.item(module).unwrap().child(), Some(charge));
    assert_eq!(fit.item(charge).unwrap().domain(), Some(Domain::Ship));
    assert_close(fit.attr(module, DAMAGE).unwrap(), 15.0);

    assert_eq!(fit.unload_charge(module).unwrap(), Some(charge));
    assert!(fit.item(charge).is_none());
    assert_eq!(fit.item(module).unwrap().child(), None);
    assert_close(fit.attr(module, DAMAGE).unwrap(), 10.0);
}

#[test]
fn test_charge_follows_module_state() {
    let mut fit = fit_with(charge_catalog());
    let module = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();
    fit.set_state(module, State::Active).unwrap();
    let charge = fit.load_charge(module, TypeId(200)).unwrap();
    assert_eq!(fit.item(charge).unwrap().state(), State::Active);

    fit.set_state(module, State::Online).unwrap();
    assert_eq!(fit.item(charge).unwrap().state(), State::Online);

    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    assert_eq!(fit.load_charge(ship, TypeId(200)), Err(Error::NotAChargeHolder(ship)));
}

#[test]
fn test_target_domain_has_no_local_effect() {
    let mut fit = fit_with(charge_catalog());
    let module = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();
    fit.set_state(module, State::Active).unwrap();

    assert_eq!(fit.registry().edge_count(), 0);
    assert_close(fit.attr(module, DAMAGE).unwrap(), 10.0);
    assert!(!fit
        .diagnostics()
        .any(|d| d.kind == DiagnosticKind::UnresolvedFilterTarget));
}

#[test]
fn test_side_effects() {
    const CHANCE: AttrId = AttrId(1089);
    const PENALTY: AttrId = AttrId(1151);
    const CHANCE_BONUS: AttrId = AttrId(1087);
    let catalog = base_catalog()
        .with_attribute(AttributeDef::new(CHANCE))
        .with_attribute(AttributeDef::new(PENALTY))
        .with_attribute(AttributeDef::new(CHANCE_BONUS))
        .with_effect(
            EffectDef::new(EffectId(80), EffectCategory::Passive)
                .with_usage_chance(CHANCE)
                .with_modifier(Modifier::item(Domain::Ship, SPEED, Operator::PostPercent, PENALTY)),
        )
        .with_effect(
            EffectDef::new(EffectId(81), EffectCategory::Passive).with_modifier(Modifier::filtered(
                TargetFilter::DomainGroup(GroupId(303)),
                Domain::Character,
                CHANCE,
                Operator::PostPercent,
                CHANCE_BONUS,
            )),
        )
        .with_type(
            TypeDef::new(TypeId(10), GroupId(303), CategoryId(20))
                .with_attr(CHANCE, 0.1)
                .with_attr(PENALTY, -10.0)
                .with_effect(EffectId(80)),
        )
        .with_type(
            TypeDef::new(TypeId(3302), GroupId(255), CATEGORY_SKILL)
                .with_attr(CHANCE_BONUS, -25.0)
                .with_effect(EffectId(81)),
        );
    let mut fit = fit_with(catalog);
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    let booster = fit.add_item(ItemKind::Booster, TypeId(10)).unwrap();
    fit.add_item(ItemKind::Skill, TypeId(3302)).unwrap();

    let side = fit.side_effects(booster).unwrap();
    assert_eq!(side.len(), 1);
    assert!(!side[&EffectId(80)].enabled);
    assert_close(side[&EffectId(80)].chance.unwrap(), 0.075);
    assert_close(fit.attr(ship, SPEED).unwrap(), 100.0);

    fit.set_side_effect(booster, EffectId(80), true).unwrap();
    assert!(fit.side_effects(booster).unwrap()[&EffectId(80)].enabled);
    assert_close(fit.attr(ship, SPEED).unwrap(), 90.0);

    fit.set_side_effect(booster, EffectId(80), false).unwrap();
    assert_close(fit.attr(ship, SPEED).unwrap(), 100.0);
}

#[test]
fn test_cap_follows_max_attribute() {
    let catalog = base_catalog()
        .with_effect(
            EffectDef::new(EffectId(90), EffectCategory::Online).with_modifier(
                Modifier::item(Domain::Ship, SHIELD_CAPACITY, Operator::PostPercent, SHIELD_BONUS)
                    .with_state(State::Online),
            ),
        )
        .with_type(
            TypeDef::new(TypeId(100), GroupId(38), MODULE)
                .with_attr(SHIELD_BONUS, 50.0)
                .with_effect(EffectId(90)),
        );
    let mut fit = fit_with(catalog);
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    let module = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();
    assert_close(fit.attr(ship, SHIELD).unwrap(), 300.0);

    fit.set_state(module, State::Online).unwrap();
    assert_close(fit.attr(ship, SHIELD).unwrap(), 450.0);

    fit.set_override(ship, SHIELD_CAPACITY, || 1000.0).unwrap();
    assert_close(fit.attr(ship, SHIELD).unwrap(), 500.0);
}

#[test]
fn test_cap_that_gains_a_value_is_applied() {
    let catalog = base_catalog()
        .with_effect(
            EffectDef::new(EffectId(90), EffectCategory::Passive).with_modifier(Modifier::item(
                Domain::Ship,
                SHIELD_CAPACITY,
                Operator::ModAdd,
                SHIELD_BONUS,
            )),
        )
        .with_type(TypeDef::new(TypeId(2), GroupId(25), CATEGORY_SHIP).with_attr(SHIELD, 500.0))
        .with_type(
            TypeDef::new(TypeId(100), GroupId(38), MODULE)
                .with_attr(SHIELD_BONUS, 300.0)
                .with_effect(EffectId(90)),
        );
    let mut fit = fit_with(catalog);
    let ship = fit.add_item(ItemKind::Ship, TypeId(2)).unwrap();
    assert_close(fit.attr(ship, SHIELD).unwrap(), 500.0);
    assert!(!fit.item(ship).unwrap().attrs().is_cached(SHIELD_CAPACITY));

    fit.add_item(ItemKind::Module, TypeId(100)).unwrap();
    assert_close(fit.attr(ship, SHIELD_CAPACITY).unwrap(), 300.0);
    assert_close(fit.attr(ship, SHIELD).unwrap(), 300.0);
}

#[test]
fn test_source_that_gains_a_value_reaches_its_target() {
    let catalog = base_catalog()
        .with_effect(
            EffectDef::new(EffectId(3), EffectCategory::Passive).with_modifier(Modifier::filtered(
                TargetFilter::DomainSkillrq(SkillRef::Type(SKILL)),
                Domain::Ship,
                SPEED_BONUS,
                Operator::ModAdd,
                SKILL_BONUS,
            )),
        )
        .with_type(
            TypeDef::new(TypeId(3301), GroupId(255), CATEGORY_SKILL)
                .with_attr(SKILL_BONUS, 10.0)
                .with_effect(EffectId(3)),
        )
        .with_type(speed_module(100, None));
    let mut fit = fit_with(catalog);
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    let module = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();
    assert_close(fit.attr(ship, SPEED).unwrap(), 100.0);
    assert!(fit
        .take_diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::MissingBaseValue && d.item == module));

    fit.add_item(ItemKind::Skill, TypeId(3301)).unwrap();
    assert_close(fit.attr(module, SPEED_BONUS).unwrap(), 10.0);
    assert_close(fit.attr(ship, SPEED).unwrap(), 110.0);
}

#[test]
fn test_dependency_cycle_is_recovered() {
    const X: AttrId = AttrId(1);
    const Y: AttrId = AttrId(2);
    let catalog = Catalog::new()
        .with_attribute(AttributeDef::new(X))
        .with_attribute(AttributeDef::new(Y))
        .with_effect(
            EffectDef::new(EffectId(1), EffectCategory::Passive)
                .with_modifier(Modifier::item(Domain::SelfItem, X, Operator::ModAdd, Y))
                .with_modifier(Modifier::item(Domain::SelfItem, Y, Operator::ModAdd, X)),
        )
        .with_type(TypeDef::new(TypeId(1), GroupId(1), MODULE).with_effect(EffectId(1)));
    let mut fit = fit_with(catalog);
    let item = fit.add_item(ItemKind::Module, TypeId(1)).unwrap();

    assert_close(fit.attr(item, X).unwrap(), 0.0);
    assert!(fit
        .take_diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::DependencyCycle && d.attr == X));
    assert_eq!(fit.diagnostics().count(), 0);
}

#[test]
fn test_unloaded_type() {
    let mut fit = fit_with(base_catalog());
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    let ghost = fit.add_item(ItemKind::Module, TypeId(999)).unwrap();
    assert_eq!(
        fit.attr(ghost, SPEED),
        Err(Error::TypeNotLoaded {
            item: ghost,
            type_id: TypeId(999),
        })
    );
    assert_close(fit.attr(ship, SPEED).unwrap(), 100.0);
    assert_eq!(fit.attr(ship, AttrId(5)), Err(Error::AttributeNotFound { attr: AttrId(5) }));
    assert_eq!(
        fit.attr(ItemId(1234), SPEED),
        Err(Error::ItemNotFound(ItemId(1234)))
    );
}

#[test]
fn test_unique_slots() {
    let mut fit = fit_with(base_catalog());
    fit.add_item(ItemKind::Ship, SHIP).unwrap();
    assert_eq!(
        fit.add_item(ItemKind::Ship, SHIP),
        Err(Error::SlotOccupied(ItemKind::Ship))
    );
    assert!(fit.ship().is_some());
    assert!(fit.character().is_none());
}

#[test]
fn test_nested_messages_reach_subscribers_first() {
    let mut fit = fit_with(base_catalog().with_type(speed_module(100, Some(50.0))));
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    fit.attr(ship, SPEED).unwrap();

    let journal = Rc::new(RefCell::new(Journal::new()));
    fit.subscribe(Box::new(journal.clone()));
    let module = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();

    let seen: Vec<Msg> = journal.borrow().messages().copied().collect();
    assert_eq!(
        seen,
        vec![
            Msg::attr_changed(ship, SPEED),
            Msg::ItemAdded { item: module },
        ]
    );
}

#[test]
fn test_capacitor_transmitter_output() {
    const AMOUNT: AttrId = AttrId(90);
    const DURATION: AttrId = AttrId(73);
    let catalog = base_catalog()
        .with_attribute(AttributeDef::new(AMOUNT))
        .with_attribute(AttributeDef::new(DURATION))
        .with_effect(
            EffectDef::new(EffectId(100), EffectCategory::Target).with_behavior(
                EffectBehavior::CapacitorTransmitter {
                    amount_attr: AMOUNT,
                    duration_attr: DURATION,
                },
            ),
        )
        .with_type(
            TypeDef::new(TypeId(100), GroupId(68), MODULE)
                .with_attr(AMOUNT, 351.0)
                .with_attr(DURATION, 5000.0)
                .with_default_effect(EffectId(100)),
        );
    let mut fit = fit_with(catalog);
    let module = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();

    let output = fit.effect_output(module, EffectId(100)).unwrap().unwrap();
    assert_close(output.amount, 351.0);
    assert_close(output.per_second, 70.2);
    assert_eq!(fit.effect_output(module, SPEED_FX).unwrap(), None);
}

#[test]
fn test_side_effect_chance_errors() {
    const CHANCE: AttrId = AttrId(1089);
    const PENALTY: AttrId = AttrId(1151);
    let catalog = base_catalog()
        .with_attribute(AttributeDef::new(CHANCE))
        .with_attribute(AttributeDef::new(PENALTY))
        .with_effect(
            EffectDef::new(EffectId(80), EffectCategory::Passive)
                .with_usage_chance(CHANCE)
                .with_modifier(Modifier::item(Domain::Ship, SPEED, Operator::PostPercent, PENALTY)),
        )
        .with_type(
            TypeDef::new(TypeId(10), GroupId(303), CategoryId(20))
                .with_attr(CHANCE, 0.1)
                .with_attr(PENALTY, -10.0)
                .with_effect(EffectId(80)),
        )
        .with_type(
            TypeDef::new(TypeId(11), GroupId(303), CategoryId(20))
                .with_attr(PENALTY, -10.0)
                .with_effect(EffectId(80)),
        );
    let mut fit = fit_with(catalog);
    let booster = fit.add_item(ItemKind::Booster, TypeId(10)).unwrap();
    let unrated = fit.add_item(ItemKind::Booster, TypeId(11)).unwrap();

    fit.set_fallible_override(booster, CHANCE, || Err("broken".to_string()))
        .unwrap();
    assert_eq!(
        fit.side_effects(booster).err(),
        Some(Error::OverrideRaised {
            item: booster,
            attr: CHANCE,
            reason: "broken".to_string(),
        })
    );

    let side = fit.side_effects(unrated).unwrap();
    assert_eq!(side[&EffectId(80)].chance, None);
    assert!(fit
        .take_diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::MissingBaseValue && d.item == unrated && d.attr == CHANCE));
}

#[test]
fn test_capacitor_transmitter_input_errors() {
    const AMOUNT: AttrId = AttrId(90);
    const DURATION: AttrId = AttrId(73);
    let catalog = base_catalog()
        .with_attribute(AttributeDef::new(AMOUNT))
        .with_attribute(AttributeDef::new(DURATION))
        .with_effect(
            EffectDef::new(EffectId(100), EffectCategory::Target).with_behavior(
                EffectBehavior::CapacitorTransmitter {
                    amount_attr: AMOUNT,
                    duration_attr: DURATION,
                },
            ),
        )
        .with_type(
            TypeDef::new(TypeId(100), GroupId(68), MODULE)
                .with_attr(AMOUNT, 351.0)
                .with_default_effect(EffectId(100)),
        );
    let mut fit = fit_with(catalog);
    let module = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();

    let output = fit.effect_output(module, EffectId(100)).unwrap().unwrap();
    assert_close(output.amount, 351.0);
    assert_close(output.per_second, 0.0);
    assert!(fit
        .take_diagnostics()
        .iter()
        .any(|d| d.kind == DiagnosticKind::MissingBaseValue && d.attr == DURATION));

    fit.set_fallible_override(module, DURATION, || Err("no cycle".to_string()))
        .unwrap();
    assert_eq!(
        fit.effect_output(module, EffectId(100)),
        Err(Error::OverrideRaised {
            item: module,
            attr: DURATION,
            reason: "no cycle".to_string(),
        })
    );
}

#[test]
fn test_removing_everything_leaves_no_state() {
    let catalog = charge_catalog().with_type(speed_module(101, Some(25.0)));
    let mut fit = fit_with(catalog);
    let ship = fit.add_item(ItemKind::Ship, SHIP).unwrap();
    let character = fit.add_item(ItemKind::Character, TypeId(1373)).unwrap();
    let skill = fit.add_item(ItemKind::Skill, SKILL).unwrap();
    let gun = fit.add_item(ItemKind::Module, TypeId(100)).unwrap();
    let prop = fit.add_item(ItemKind::Module, TypeId(101)).unwrap();
    fit.load_charge(gun, TypeId(200)).unwrap();
    fit.set_state(gun, State::Active).unwrap();

    fit.attr(ship, SPEED).unwrap();
    fit.attr(gun, DAMAGE).unwrap();
    fit.set_override(prop, SPEED_BONUS, || 30.0).unwrap();
    assert!(fit.cached_entry_count() > 0);
    assert!(fit.registry().edge_count() > 0);

    for item in [gun, prop, skill, character, ship] {
        fit.remove_item(item).unwrap();
    }
    assert_eq!(fit.items().count(), 0);
    assert_eq!(fit.cached_entry_count(), 0);
    assert_eq!(fit.registry().edge_count(), 0);
    assert!(fit.registry().is_empty());
}
