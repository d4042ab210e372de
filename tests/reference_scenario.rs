//! End-to-end walk through the night-light engine.
//!
//! London in February 2017: automatic schedule, disable-until-tomorrow,
//! manual windows, smoothing cancellation, day rollover and degenerate
//! windows, with exact notification counts along the way.

use chrono::{DateTime, FixedOffset, TimeZone};
use nightlightd::core::events::Property;
use nightlightd::core::scheduler::TimerQueue;
use nightlightd::time::ManualClock;
use nightlightd::{NightLight, ScheduleConfig};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

type Counts = Rc<RefCell<HashMap<Property, u32>>>;

fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(y, mo, d, h, mi, 0)
        .unwrap()
}

fn count(counts: &Counts, property: Property) -> u32 {
    counts.borrow().get(&property).copied().unwrap_or(0)
}

fn assert_counts(counts: &Counts, active: u32, sunrise: u32, sunset: u32, temp: u32, dut: u32) {
    assert_eq!(count(counts, Property::Active), active, "active count");
    assert_eq!(count(counts, Property::Sunrise), sunrise, "sunrise count");
    assert_eq!(count(counts, Property::Sunset), sunset, "sunset count");
    assert_eq!(count(counts, Property::Temperature), temp, "temperature count");
    assert_eq!(count(counts, Property::DisabledUntilTmw), dut, "disabled-until-tmw count");
}

fn drain_timers(engine: &mut NightLight<TimerQueue>) {
    while let Some((_, timer)) = engine.scheduler_mut().pop_due() {
        engine.on_timer(timer);
    }
}

fn assert_temperature_near(engine: &NightLight<TimerQueue>, expected: f64, tolerance: f64) {
    let actual = engine.temperature();
    assert!(
        (actual - expected).abs() <= tolerance,
        "temperature {actual} not within {tolerance} of {expected}"
    );
}

#[test]
fn test_reference_scenario() {
    let clock = ManualClock::new(utc(2017, 2, 8, 20, 0));
    let config = ScheduleConfig {
        enabled: false,
        automatic: false,
        ..ScheduleConfig::default()
    };
    let mut engine = NightLight::new(
        config,
        Box::new(clock.clone()),
        TimerQueue::with_clock(Box::new(clock.clone())),
    );

    let counts: Counts = Rc::new(RefCell::new(HashMap::new()));
    let sink = counts.clone();
    engine.subscribe(move |property, _| {
        *sink.borrow_mut().entry(property).or_insert(0) += 1;
    });

    engine.set_smooth_enabled(false);
    engine.set_date_time_override(Some(utc(2017, 2, 8, 20, 0)));

    // Nothing happens while disabled
    engine.update_config(|c| c.target_temperature = 4000);
    engine.update_config(|c| c.automatic = true);
    engine.update_config(|c| {
        c.latitude = 51.5;
        c.longitude = -0.1278;
    });
    assert_counts(&counts, 0, 0, 0, 0, 0);
    assert!(!engine.active());
    assert_eq!(engine.sunrise(), -1.0);

    // Enable automatic mode
    engine.update_config(|c| c.enabled = true);
    assert_counts(&counts, 1, 1, 1, 1, 0);
    assert!(engine.active());
    assert!(!engine.disabled_until_tomorrow());
    assert!((7.0..8.0).contains(&engine.sunrise()), "sunrise {}", engine.sunrise());
    assert!(
        (16.75..17.25).contains(&engine.sunset()),
        "sunset {}",
        engine.sunset()
    );
    assert_eq!(engine.temperature(), 4000.0);

    // Disabling twice only counts once
    engine.set_disabled_until_tomorrow(true);
    engine.set_disabled_until_tomorrow(true);
    assert_counts(&counts, 1, 1, 1, 2, 1);
    assert!(engine.active());
    assert!(engine.disabled_until_tomorrow());
    assert_eq!(engine.temperature(), 6500.0);

    // And back again
    engine.set_disabled_until_tomorrow(false);
    assert_counts(&counts, 1, 1, 1, 3, 2);
    assert!(!engine.disabled_until_tomorrow());
    assert_eq!(engine.temperature(), 4000.0);

    // A manual day window leaves the night
    engine.update_config(|c| c.manual_from = 4.0);
    engine.update_config(|c| c.manual_to = 16.0);
    engine.update_config(|c| c.automatic = false);
    assert_counts(&counts, 2, 1, 1, 4, 2);
    assert!(!engine.active());
    assert_eq!(engine.temperature(), 6500.0);
    // Sunrise and sunset stay cached
    assert!((7.0..8.0).contains(&engine.sunrise()));
    assert!((16.75..17.25).contains(&engine.sunset()));

    // Disabling does not change anything while inactive
    engine.update_config(|c| c.enabled = false);
    assert_counts(&counts, 2, 1, 1, 4, 2);

    // With smoothing, enabling starts a ramp from 6500
    engine.set_smooth_enabled(true);
    engine.update_config(|c| c.automatic = true);
    engine.update_config(|c| c.enabled = true);
    assert!(engine.active());
    assert_eq!(engine.temperature(), 6500.0);

    // Leaving the night right away cancels the ramp
    engine.update_config(|c| c.automatic = false);
    engine.update_config(|c| c.enabled = false);
    assert!(!engine.active());
    clock.advance(Duration::from_secs(5));
    drain_timers(&mut engine);
    assert_eq!(engine.temperature(), 6500.0);

    // Disabled until tomorrow clears once the window end has passed
    engine.update_config(|c| {
        c.manual_from = 17.0;
        c.manual_to = 7.0;
    });
    engine.update_config(|c| c.enabled = true);
    assert!(engine.active());
    engine.set_disabled_until_tomorrow(true);
    assert!(engine.disabled_until_tomorrow());

    engine.set_date_time_override(Some(utc(2017, 2, 9, 1, 0)));
    assert!(engine.disabled_until_tomorrow());

    engine.set_date_time_override(Some(utc(2017, 2, 9, 8, 0)));
    assert!(!engine.disabled_until_tomorrow());

    // Or after 24 hours at the latest
    engine.set_disabled_until_tomorrow(true);
    assert!(engine.disabled_until_tomorrow());
    engine.set_date_time_override(Some(utc(2017, 2, 10, 20, 0)));
    assert!(!engine.disabled_until_tomorrow());

    // Equal bounds mean night light all day without smearing
    engine.set_smooth_enabled(false);
    engine.update_config(|c| {
        c.manual_from = 6.0;
        c.manual_to = 6.0;
    });
    for (h, m) in [(5, 50), (6, 0), (6, 10)] {
        engine.set_date_time_override(Some(utc(2017, 2, 11, h, m)));
        assert!(engine.active(), "inactive at {h:02}:{m:02}");
        assert_eq!(engine.temperature(), 4000.0);
    }

    // A six minute window is smeared over its whole length
    engine.update_config(|c| c.manual_to = 6.1);
    for (h, m) in [(5, 50), (6, 20)] {
        engine.set_date_time_override(Some(utc(2017, 2, 11, h, m)));
        assert!(!engine.active(), "active at {h:02}:{m:02}");
        assert_eq!(engine.temperature(), 6500.0);
    }
    engine.set_date_time_override(Some(utc(2017, 2, 11, 6, 3)));
    assert!(engine.active());
    assert_temperature_near(&engine, 5250.0, 20.0);

    // The same with the bounds swapped
    engine.update_config(|c| {
        c.manual_from = 6.1;
        c.manual_to = 6.0;
    });
    engine.set_date_time_override(Some(utc(2017, 2, 11, 6, 3)));
    assert!(engine.active());
    assert_temperature_near(&engine, 5250.0, 20.0);
}

#[test]
fn test_smoothing_reaches_target_after_duration() {
    let clock = ManualClock::new(utc(2017, 2, 8, 22, 0));
    let config = ScheduleConfig {
        enabled: true,
        automatic: false,
        manual_from: 20.0,
        manual_to: 6.0,
        target_temperature: 3000,
        ..ScheduleConfig::default()
    };
    let mut engine = NightLight::new(
        config,
        Box::new(clock.clone()),
        TimerQueue::with_clock(Box::new(clock.clone())),
    );
    engine.start();
    assert!(engine.active());
    assert_eq!(engine.temperature(), 6500.0);

    let mut previous = engine.temperature();
    for _ in 0..100 {
        clock.advance(Duration::from_millis(50));
        drain_timers(&mut engine);
        assert!(engine.temperature() <= previous, "ramp must not reverse");
        previous = engine.temperature();
    }
    assert_temperature_near(&engine, 3000.0, 10.0);
    assert!(!engine.scheduler().contains(nightlightd::core::scheduler::Timer::Smooth));
}
