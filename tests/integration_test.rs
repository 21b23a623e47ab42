use hammertrace::generator::HammerTraceGenerator;
use hammertrace::memory::{AddressMapping, DRAMAddr, DramGeometry};
use hammertrace::trace::{TraceEnd, TraceReader};
use hammertrace::util::{NEIGHBOR_ACTIVATION, Rng};
use hammertrace::{ConfigError, DramConfig, MitigationScheme, apply_mitigation};
use rand::Rng as _;
use std::fs;
use std::io::{BufReader, BufWriter};
use std::path::PathBuf;

const DDR4_CONFIG: &str = "config/ddr4-8gb-x8.json";
const SMALL_CONFIG: &str = "config/ddr3-small.json";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn scratch_file(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("hammertrace-{}", std::process::id()));
    fs::create_dir_all(&dir).expect("temp dir is writable");
    dir.join(name)
}

#[test]
fn test_load_ddr4_config() -> anyhow::Result<()> {
    let config = DramConfig::from_jsonfile(DDR4_CONFIG)?;
    let geometry = DramGeometry::from_config(&config)?;
    assert_eq!(geometry.mapping, AddressMapping::RoCoRaBaBgCh);
    assert_eq!(geometry.ranks, 2);
    assert_eq!(geometry.columns, 128);
    assert_eq!(geometry.throwaway_bits, 6);
    assert_eq!(geometry.row_slots(), Some(2 * 16 * 65536));
    // DDR4-2400: tRAS 39, tRP 16
    assert_eq!(config.interarrival_time()?, 57);
    Ok(())
}

#[test]
fn test_missing_config_file() {
    assert!(matches!(
        DramConfig::from_jsonfile("config/does-not-exist.json"),
        Err(ConfigError::IoError(_))
    ));
}

#[test]
fn test_roundtrip_every_mapping() -> anyhow::Result<()> {
    let config = DramConfig::from_jsonfile(DDR4_CONFIG)?;
    let mut rng = Rng::from_seed(0xdd4);
    for mapping in AddressMapping::ALL {
        let config = DramConfig {
            address_mapping: mapping.name().to_string(),
            ..config.clone()
        };
        let geometry = DramGeometry::from_config(&config)?;
        for _ in 0..10_000 {
            let linear: u64 = rng.random_range(0..1u64 << geometry.address_bits());
            let addr = DRAMAddr::from_linear(linear, &geometry);
            let encoded = addr.to_linear(&geometry)?;
            assert_eq!(encoded, linear & !0x3f, "{}", mapping.name());
            assert_eq!(DRAMAddr::from_linear(encoded, &geometry), addr);
        }
    }
    Ok(())
}

#[test]
fn test_counting_scenario() -> anyhow::Result<()> {
    init_logging();
    let geometry = DramGeometry::from_config(&DramConfig::from_jsonfile(SMALL_CONFIG)?)?;
    let aggressor = DRAMAddr::new(1, 0, 1, 0, 500, 17);
    let address = aggressor.to_linear(&geometry)?;

    let trace = scratch_file("counting_scenario");
    fs::write(
        &trace,
        format!("0x{address:08X} READ 10\n0x{address:08X} READ 20\n0x{address:08X} WRITE 30\n"),
    )?;
    let mitigated = apply_mitigation(
        &geometry,
        &trace,
        MitigationScheme::Counting { threshold: 3 },
        None,
    )?;
    assert_eq!(
        mitigated.trace,
        PathBuf::from(format!("{}_CRA_applied", trace.display()))
    );

    let output = fs::read_to_string(&mitigated.trace)?;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 5);
    assert_eq!(lines[0], format!("0x{address:08X} READ 10"));
    assert_eq!(lines[2], format!("0x{address:08X} WRITE 30"));
    let below = aggressor.with_row(499).to_linear(&geometry)?;
    let above = aggressor.with_row(501).to_linear(&geometry)?;
    assert_eq!(lines[3], format!("0x{below:x} {NEIGHBOR_ACTIVATION} 31"));
    assert_eq!(lines[4], format!("0x{above:x} {NEIGHBOR_ACTIVATION} 32"));

    let report = mitigated.report.expect("mitigation enabled");
    assert_eq!(report.detector, "CRA");
    assert_eq!(report.records, 3);
    assert_eq!(report.mitigations, 1);
    assert_eq!(report.injected, 2);
    assert_eq!(report.aggressors.len(), 1);
    assert_eq!(report.aggressors[0].dram_addr, aggressor);
    assert_eq!(report.end, TraceEnd::Exhausted);
    Ok(())
}

#[test]
fn test_disabled_keeps_trace() -> anyhow::Result<()> {
    let geometry = DramGeometry::from_config(&DramConfig::from_jsonfile(SMALL_CONFIG)?)?;
    let trace = scratch_file("disabled");
    fs::write(&trace, "0x0 READ 0\n")?;
    let mitigated = apply_mitigation(&geometry, &trace, MitigationScheme::Disabled, None)?;
    assert_eq!(mitigated.trace, trace);
    assert!(mitigated.report.is_none());
    Ok(())
}

#[test]
fn test_generated_attack_refreshes_victim() -> anyhow::Result<()> {
    init_logging();
    const THRESHOLD: u32 = 100;
    let geometry = DramGeometry::from_config(&DramConfig::from_jsonfile(DDR4_CONFIG)?)?;
    let mut generator = HammerTraceGenerator::new(&geometry, Rng::from_seed(0xa77ac));
    let plan = generator.plan()?;

    let trace = scratch_file("generated_attack");
    let requests = 10 * THRESHOLD as u64;
    generator.write_trace(&plan, requests, 50, BufWriter::new(fs::File::create(&trace)?))?;

    let mitigated = apply_mitigation(
        &geometry,
        &trace,
        MitigationScheme::Counting {
            threshold: THRESHOLD,
        },
        None,
    )?;
    let report = mitigated.report.expect("mitigation enabled");
    // aggressor and breaker each receive half of the requests
    assert_eq!(report.records, requests);
    assert_eq!(report.mitigations, 10);
    assert_eq!(report.aggressors.len(), 2);

    let victim = plan.victim.to_linear(&geometry)?;
    let activations: Vec<u64> =
        TraceReader::new(BufReader::new(fs::File::open(&mitigated.trace)?))
            .map(|l| l.record)
            .filter(|r| r.operation == NEIGHBOR_ACTIVATION)
            .map(|r| DRAMAddr::from_linear(r.address, &geometry).with_row(0))
            .map(|a| a.to_linear(&geometry))
            .collect::<Result<_, _>>()?;
    assert_eq!(activations.len() as u64, report.injected);
    // all activations stay in the attacked bank
    let bank = plan.victim.with_row(0).to_linear(&geometry)?;
    assert!(activations.iter().all(|&a| a == bank));

    let victim_refreshes = TraceReader::new(BufReader::new(fs::File::open(&mitigated.trace)?))
        .filter(|l| l.record.operation == NEIGHBOR_ACTIVATION && l.record.address == victim)
        .count();
    // refreshed by every aggressor trigger, and by the breaker's if it borders the victim
    let breaker_borders_victim = plan.breaker.row.abs_diff(plan.victim.row) == 1;
    let expected = if breaker_borders_victim { 10 } else { 5 };
    assert_eq!(victim_refreshes, expected);
    Ok(())
}

#[test]
fn test_probabilistic_rate_on_file() -> anyhow::Result<()> {
    let geometry = DramGeometry::from_config(&DramConfig::from_jsonfile(SMALL_CONFIG)?)?;
    let trace = scratch_file("probabilistic");
    let mut rng = Rng::from_seed(17);
    let mut contents = String::new();
    const N: u64 = 200_000;
    for cycle in 0..N {
        let addr = DRAMAddr::new(
            rng.random_range(0..geometry.channels),
            rng.random_range(0..geometry.ranks),
            rng.random_range(0..geometry.bankgroups),
            rng.random_range(0..geometry.banks),
            rng.random_range(1..geometry.rows - 1),
            rng.random_range(0..geometry.columns),
        );
        contents += &format!("0x{:x} READ {}\n", addr.to_linear(&geometry)?, cycle * 4);
    }
    fs::write(&trace, contents)?;

    let mitigated = apply_mitigation(
        &geometry,
        &trace,
        MitigationScheme::Probabilistic {
            probability: 0.01,
            seed: 42,
        },
        None,
    )?;
    let report = mitigated.report.expect("mitigation enabled");
    let rate = report.mitigations as f64 / N as f64;
    assert!((rate - 0.01).abs() < 0.002, "rate {rate}");
    // interior rows only, two activations each
    assert_eq!(report.injected, 2 * report.mitigations);
    assert!(report.aggressors.is_empty());
    Ok(())
}
