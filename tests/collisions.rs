use hdsim::core::init::InitialConfiguration;
use hdsim::core::Simulation;
use hdsim::error::{Error, Result};
use hdsim::SimConfig;

fn fluid(seed: u64) -> Result<Simulation> {
    SimConfig {
        n: 30,
        lx: 16.0,
        seed: Some(seed),
        initial: InitialConfiguration::Fluid,
        placement_attempts: 500,
        ..SimConfig::default()
    }
    .build()
}

/// Two disks approaching head-on in a 10 x 10 box touch when their centres
/// are one apart, then swap velocities.
#[test]
fn head_on_pair_collides_and_swaps() -> Result<()> {
    let mut sim = Simulation::new(
        &[[2.0, 5.0], [8.0, 5.0]],
        &[[1.0, 0.0], [-1.0, 0.0]],
        10.0,
        10.0,
        None,
        20,
    )?;
    let ev = sim.step()?;
    assert_eq!((ev.i, ev.j), (0, 1));
    assert!((ev.dt - 2.5).abs() < 1e-12, "dt = {}", ev.dt);
    assert!((sim.particles[0].v[0] + 1.0).abs() < 1e-12);
    assert!((sim.particles[1].v[0] - 1.0).abs() < 1e-12);
    assert!(sim.particles[0].v[1].abs() < 1e-12);

    // They now fly apart and meet again through the boundary: gap 9 - 1 at speed 2.
    let ev = sim.step()?;
    assert!((ev.dt - 4.0).abs() < 1e-12, "dt = {}", ev.dt);
    assert!((ev.time - 6.5).abs() < 1e-12);
    assert_eq!(sim.particles[0].collision_count, 2);
    Ok(())
}

#[test]
fn contact_distance_at_every_event() -> Result<()> {
    let mut sim = fluid(11)?;
    for _ in 0..500 {
        let ev = sim.step()?;
        let d = sim
            .periodic_box()
            .distance(sim.particles[ev.i].r, sim.particles[ev.j].r);
        assert!(
            (d - 1.0).abs() < 1e-8,
            "disks {} and {} at distance {d} when colliding",
            ev.i,
            ev.j
        );
        assert!(ev.virial > -1e-9, "approaching pair gave virial {}", ev.virial);
    }
    Ok(())
}

#[test]
fn no_overlap_between_events() -> Result<()> {
    let mut sim = fluid(23)?;
    let n = sim.num_particles();
    for _ in 0..200 {
        let dt = sim.next_event_time().ok_or(Error::NoCollision)?;
        sim.drift(0.5 * dt)?;
        for i in 0..n {
            for j in (i + 1)..n {
                let d = sim
                    .periodic_box()
                    .distance(sim.particles[i].r, sim.particles[j].r);
                assert!(d >= 1.0 - 1e-9, "disks {i} and {j} overlap: {d}");
            }
        }
        sim.step()?;
    }
    Ok(())
}

#[test]
fn positions_stay_inside_box() -> Result<()> {
    let mut sim = fluid(5)?;
    let bx = *sim.periodic_box();
    for _ in 0..300 {
        sim.step()?;
        for p in &sim.particles {
            assert!((0.0..bx.lx).contains(&p.r[0]) && (0.0..bx.ly).contains(&p.r[1]));
        }
    }
    Ok(())
}

#[test]
fn momentum_and_energy_conserved_over_many_collisions() -> Result<()> {
    let mut sim = SimConfig {
        seed: Some(12345),
        ..SimConfig::default()
    }
    .build()?;
    let e0 = sim.kinetic_energy();
    let p0 = sim.total_momentum();
    sim.run(2000)?;
    let e1 = sim.kinetic_energy();
    let p1 = sim.total_momentum();
    let rel = ((e1 - e0) / e0).abs();
    assert!(rel < 1e-10, "relative energy drift {rel} (E0={e0}, E1={e1})");
    assert!((p1[0] - p0[0]).abs() < 1e-9 && (p1[1] - p0[1]).abs() < 1e-9);
    Ok(())
}

#[test]
fn resting_disks_never_collide() -> Result<()> {
    let mut sim = Simulation::new(
        &[[2.0, 2.0], [5.0, 5.0], [8.0, 8.0]],
        &[[0.0, 0.0], [0.0, 0.0], [0.0, 0.0]],
        10.0,
        10.0,
        Some(5.0),
        20,
    )?;
    assert!(sim.predictions().iter().all(|p| p.is_none()));
    assert!(matches!(sim.step(), Err(Error::NoCollision)));
    Ok(())
}

#[test]
fn resting_disk_off_the_collision_line_is_never_involved() -> Result<()> {
    let mut sim = Simulation::new(
        &[[2.0, 2.0], [8.0, 2.0], [5.0, 7.0]],
        &[[1.0, 0.0], [-1.0, 0.0], [0.0, 0.0]],
        10.0,
        10.0,
        None,
        20,
    )?;
    for _ in 0..20 {
        let ev = sim.step()?;
        assert!(ev.i != 2 && ev.j != 2);
    }
    assert_eq!(sim.particles[2].r, [5.0, 7.0]);
    assert_eq!(sim.particles[2].collision_count, 0);
    Ok(())
}
