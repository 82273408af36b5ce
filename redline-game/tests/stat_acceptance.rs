use rand::SeedableRng;
use rand::rngs::SmallRng;
use redline_game::{
    Car, CarStats, EngineConfig, Opponent, PlayerProfile, RngBundle, SkillConfig, Skills,
    SpecialPart, resolve_race, roll_skill_growth, skill_chance,
};
use std::convert::TryFrom;

const SAMPLE_SIZE: usize = 5000;
const TOLERANCE: f64 = 0.025;
const NOW: i64 = 1_700_000_000_000;

fn rate(hits: usize) -> f64 {
    let hits = u32::try_from(hits).expect("count fits");
    let total = u32::try_from(SAMPLE_SIZE).expect("sample size fits u32");
    f64::from(hits) / f64::from(total)
}

fn profile_with_nitro(cfg: &EngineConfig) -> PlayerProfile {
    let mut car = Car::new("c", "Test", 20_000, CarStats::new(70, 70, 70, 70), cfg);
    car.special_parts.install(SpecialPart::Nitro);
    PlayerProfile::new_career("p", car, cfg)
}

#[test]
fn nitro_activation_tracks_configured_chance() {
    let cfg = EngineConfig::default();
    let profile = profile_with_nitro(&cfg);
    let opponent = Opponent::new("Pacer", 1.0, 500, &cfg.fuel);
    let rng = RngBundle::from_user_seed(0x5EED);

    let mut fired = 0usize;
    for _ in 0..SAMPLE_SIZE {
        let resolution = resolve_race(&profile, 0, &opponent, 0, NOW, &cfg, &rng).expect("race accepted");
        if resolution.outcome.nitro_activated {
            fired += 1;
        }
    }
    let observed = rate(fired);
    assert!(
        (observed - cfg.parts.nitro_chance).abs() <= TOLERANCE,
        "nitro rate drifted: observed {observed:.4}"
    );
}

#[test]
fn skill_growth_matches_base_chances() {
    let cfg = SkillConfig::default();
    let mut rng = SmallRng::seed_from_u64(0xA11CE);
    for (won, expected) in [(true, 0.5), (false, 0.2)] {
        assert!((skill_chance(0, won, &cfg) / 100.0 - expected).abs() < f64::EPSILON);
        let mut grew = 0usize;
        for _ in 0..SAMPLE_SIZE {
            let mut skills = Skills::default();
            if roll_skill_growth(&mut skills, won, &cfg, &mut rng).improved() {
                grew += 1;
            }
        }
        let observed = rate(grew);
        assert!(
            (observed - expected).abs() <= TOLERANCE,
            "skill growth (won={won}) drifted: observed {observed:.4}"
        );
    }
}

#[test]
fn skill_picks_are_uniform() {
    let cfg = SkillConfig::default();
    let mut rng = SmallRng::seed_from_u64(0xB0B);
    let mut picks = [0usize; 4];
    for _ in 0..SAMPLE_SIZE {
        let mut skills = Skills::default();
        let roll = roll_skill_growth(&mut skills, true, &cfg, &mut rng);
        let slot = redline_game::SkillKind::ALL
            .iter()
            .position(|kind| *kind == roll.skill)
            .expect("known skill");
        picks[slot] += 1;
    }
    for count in picks {
        assert!((rate(count) - 0.25).abs() <= TOLERANCE, "skill pick skewed: {picks:?}");
    }
}

#[test]
fn opponent_times_stay_within_jitter_bounds() {
    let cfg = EngineConfig::default();
    let profile = profile_with_nitro(&cfg);
    let opponent = Opponent::new("Pacer", 1.0, 500, &cfg.fuel);
    let rng = RngBundle::from_user_seed(77);

    // Difficulty 1.0 means a 100 second reference lap before jitter.
    let (low, high) = (100.0 * cfg.race.jitter_min, 100.0 * cfg.race.jitter_max);
    let mut total = 0.0;
    for _ in 0..SAMPLE_SIZE {
        let outcome = resolve_race(&profile, 0, &opponent, 0, NOW, &cfg, &rng)
            .expect("race accepted")
            .outcome;
        assert!(
            outcome.opponent_time >= low - 0.005 && outcome.opponent_time <= high + 0.005,
            "opponent time {} outside [{low}, {high}]",
            outcome.opponent_time
        );
        total += outcome.opponent_time;
    }
    let mean = total / f64::from(u32::try_from(SAMPLE_SIZE).expect("sample size fits u32"));
    assert!((mean - 100.0).abs() < 0.5, "jitter is biased: mean {mean:.3}");
}

#[test]
fn evenly_matched_races_split_wins() {
    let cfg = EngineConfig::default();
    // Zeroed skills keep the multiplier at one, so both sides run at efficiency 60.
    let car = Car::new("c", "Even", 20_000, CarStats::new(60, 60, 60, 60), &cfg);
    let mut profile = PlayerProfile::new_career("p", car, &cfg);
    profile.skills = Skills {
        driving: 0,
        speed: 0,
        reaction: 0,
        technique: 0,
    };
    let opponent = Opponent::new("Mirror", 1.0, 500, &cfg.fuel);
    let rng = RngBundle::from_user_seed(2024);
    let mut wins = 0usize;
    for _ in 0..SAMPLE_SIZE {
        if resolve_race(&profile, 0, &opponent, 0, NOW, &cfg, &rng)
            .expect("race accepted")
            .outcome
            .won
        {
            wins += 1;
        }
    }
    // Ties favour the opponent, so the rate sits a hair under one half.
    let observed = rate(wins);
    assert!((observed - 0.5).abs() <= TOLERANCE, "win rate {observed:.4}");
}
