#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use student_form::{
    config::Config,
    controller::FormController,
    form::student_form,
    scheduler::{Clock, ManualClock},
    storage::{KeyValueStore, MemoryStore},
    submission::{SimulatedSubmitter, Submitter},
};

pub type TestController =
    FormController<MemoryStore, SimulatedSubmitter<ManualClock>, ManualClock>;

/// Clock pinned to a school-year morning so age checks are stable.
pub fn fixed_clock() -> ManualClock {
    ManualClock::new(Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap())
}

pub fn controller_with(storage: MemoryStore) -> (TestController, ManualClock) {
    let clock = fixed_clock();
    let controller = FormController::new(
        student_form(),
        storage,
        SimulatedSubmitter::new(clock.clone()),
        clock.clone(),
        &Config::default(),
    );
    (controller, clock)
}

pub fn controller() -> (TestController, ManualClock) {
    controller_with(MemoryStore::new())
}

/// A complete, valid set of field values.
pub const VALID_STUDENT: [(&str, &str); 9] = [
    ("firstName", "Jo"),
    ("lastName", "Doe"),
    ("email", "jo@school.edu"),
    ("phone", "+15551234567"),
    ("dateOfBirth", "2008-03-14"),
    ("studentId", "S-1042"),
    ("school", "Central High"),
    ("grade", "11"),
    ("gpa", "3.80"),
];

pub fn fill_valid<S, P, C>(controller: &mut FormController<S, P, C>)
where
    S: KeyValueStore,
    P: Submitter,
    C: Clock + Clone,
{
    for (name, value) in VALID_STUDENT {
        controller.input(name, value).unwrap();
    }
}
