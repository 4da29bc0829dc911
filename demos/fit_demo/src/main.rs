//! Fit Demo
//!
//! Loads a small catalog from RON files and fits a frigate with skills,
//! an afterburner, rigs, a booster and a capacitor transmitter. Each step
//! prints how the ship's velocity reacts to the change.
//!
//! Run with: cargo run -p fit_demo
//! Set `RUST_LOG=dogma_core=debug` to watch the engine's decisions.

use dogma_core::{AttrId, EffectId, Fit, ItemId, ItemKind, Journal, State, StateRestriction, TypeId};
use dogma_script::{load_config_file, Loader};
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use tracing::info;

const MAX_VELOCITY: AttrId = AttrId(37);
const SPEED_FACTOR: AttrId = AttrId(20);
const SHIELD_CHARGE: AttrId = AttrId(264);

const RIFTER: TypeId = TypeId(587);
const CHARACTER: TypeId = TypeId(1373);
const AFTERBURNER: TypeId = TypeId(438);
const THRUSTERS_I: TypeId = TypeId(31105);
const THRUSTERS_II: TypeId = TypeId(31107);
const NAVIGATION: TypeId = TypeId(3449);
const AFTERBURNER_SKILL: TypeId = TypeId(3450);
const NEUROTOXIN_CONTROL: TypeId = TypeId(3411);
const CAP_TRANSMITTER: TypeId = TypeId(1190);
const BLUE_PILL: TypeId = TypeId(10164);

const TRANSMIT_EFFECT: EffectId = EffectId(6184);
const BOOSTER_PENALTY: EffectId = EffectId(5357);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let root = Path::new(env!("CARGO_MANIFEST_DIR"));

    let mut loader = Loader::new();
    loader.load_directory(root.join("data"))?;
    let (attributes, effects, types) = loader.counts();
    info!(attributes, effects, types, "catalog files loaded");

    let catalog = Arc::new(loader.finish()?);
    let config = load_config_file(root.join("config.ron"))?;

    let mut fit = Fit::with_config(catalog, config);

    let journal = Rc::new(RefCell::new(Journal::new()));
    let restriction = Rc::new(RefCell::new(StateRestriction::new()));
    fit.subscribe(Box::new(Rc::clone(&journal)));
    fit.subscribe(Box::new(Rc::clone(&restriction)));

    println!("=== Dogma Fit Demo ===\n");

    let ship = fit.add_item(ItemKind::Ship, RIFTER)?;
    fit.add_item(ItemKind::Character, CHARACTER)?;
    print_velocity(&mut fit, ship, "hull")?;

    let navigation = fit.add_item(ItemKind::Skill, NAVIGATION)?;
    fit.add_item(ItemKind::Skill, AFTERBURNER_SKILL)?;
    print_velocity(&mut fit, ship, "with Navigation")?;

    let afterburner = fit.add_item(ItemKind::Module, AFTERBURNER)?;
    fit.set_state(afterburner, State::Online)?;
    print_velocity(&mut fit, ship, "afterburner online")?;
    fit.set_state(afterburner, State::Active)?;
    println!(
        "  afterburner speed factor: {:.1}%",
        fit.attr(afterburner, SPEED_FACTOR)?
    );
    print_velocity(&mut fit, ship, "afterburner active")?;

    // Rig bonuses share the ship's velocity with the afterburner and get
    // stacking penalized; the skill bonus does not.
    println!("\n--- Rigs ---");
    fit.add_item(ItemKind::Rig, THRUSTERS_II)?;
    print_velocity(&mut fit, ship, "one rig")?;
    let second_rig = fit.add_item(ItemKind::Rig, THRUSTERS_I)?;
    print_velocity(&mut fit, ship, "two rigs")?;
    fit.remove_item(second_rig)?;
    print_velocity(&mut fit, ship, "second rig removed")?;

    println!("\n--- Override ---");
    fit.set_override(navigation, AttrId(315), || 50.0)?;
    print_velocity(&mut fit, ship, "Navigation overridden to 50%")?;
    fit.clear_override(navigation, AttrId(315))?;
    print_velocity(&mut fit, ship, "override cleared")?;

    println!("\n--- Booster side effect ---");
    let booster = fit.add_item(ItemKind::Booster, BLUE_PILL)?;
    fit.add_item(ItemKind::Skill, NEUROTOXIN_CONTROL)?;
    for (effect, status) in fit.side_effects(booster)? {
        let chance = status.chance.unwrap_or(0.0) * 100.0;
        println!("  side effect {}: {:.1}% chance, enabled: {}", effect, chance, status.enabled);
    }
    fit.set_side_effect(booster, BOOSTER_PENALTY, true)?;
    print_velocity(&mut fit, ship, "booster penalty enabled")?;
    fit.set_side_effect(booster, BOOSTER_PENALTY, false)?;
    print_velocity(&mut fit, ship, "booster penalty disabled")?;

    println!("\n--- Capacitor transmitter ---");
    let transmitter = fit.add_item(ItemKind::Module, CAP_TRANSMITTER)?;
    fit.set_state(transmitter, State::Active)?;
    if let Some(output) = fit.effect_output(transmitter, TRANSMIT_EFFECT)? {
        println!(
            "  transfers {:.1} GJ per cycle ({:.2} GJ/s)",
            output.amount, output.per_second
        );
    }

    println!("\n--- Capped attribute ---");
    println!("  shield charge: {:.1}", fit.attr(ship, SHIELD_CHARGE)?);

    println!("\n--- State restriction ---");
    fit.set_state(afterburner, State::Overload)?;
    for violation in restriction.borrow().validate(&fit) {
        println!(
            "  {} is {} but allows at most {}",
            violation.item, violation.state, violation.max_state
        );
    }

    println!("\n--- Engine ---");
    println!("  cached attribute values: {}", fit.cached_entry_count());
    println!("  affection edges: {}", fit.registry().edge_count());
    for diagnostic in fit.diagnostics() {
        println!(
            "  diagnostic: {} on {} ({})",
            diagnostic.kind, diagnostic.item, diagnostic.attr
        );
    }

    let stats = journal.borrow().stats();
    println!("\n--- Journal ({} messages) ---", stats.total_entries);
    for (kind, count) in &stats.by_kind {
        println!("  {:?}: {}", kind, count);
    }

    Ok(())
}

fn print_velocity(fit: &mut Fit, ship: ItemId, label: &str) -> dogma_core::Result<()> {
    println!("  {:<32} {:>8.2} m/s", label, fit.attr(ship, MAX_VELOCITY)?);
    Ok(())
}
