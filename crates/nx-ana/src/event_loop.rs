//! The spill/event iteration shared by [`CsvMaker`](crate::CsvMaker) and
//! [`SpectrumLoader`](crate::SpectrumLoader).

use nx_core::{Error, Exposure, Result, RunSummary, SpillSource};

use crate::cut::Cut;

/// What to do when a cut, variable or weight fails on one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Drop the record (or spill) and keep going. Failures are counted.
    #[default]
    Skip,
    /// Stop the run with the failure.
    Abort,
}

/// Outcome of handling one record.
pub(crate) enum EventOutcome {
    /// Record selected and processed.
    Passed,
    /// Record rejected by the selection.
    Rejected,
}

/// Stream every spill of `source`, gate on `spill_cut`, and hand each record
/// of a passing spill to `on_event`.
///
/// Per-record errors ([`Error::Extraction`]) are counted and skipped or
/// returned according to `policy`; any other error ends the run.
pub(crate) fn run<Src, F>(
    source: &mut Src,
    spill_cut: &Cut<Src::Info>,
    policy: FailurePolicy,
    mut on_event: F,
) -> Result<RunSummary>
where
    Src: SpillSource,
    Src::Info: 'static,
    F: FnMut(&Src::Record) -> Result<EventOutcome>,
{
    let mut summary = RunSummary::default();

    while let Some(spill) =
        source.next_spill().map_err(|e| name_source_error(&source.describe(), e))?
    {
        summary.spills_seen += 1;
        match spill_cut.pass(&spill.info) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) if e.is_per_event() && policy == FailurePolicy::Skip => {
                log::debug!("spill {} skipped: {e}", summary.spills_seen);
                summary.spills_failed += 1;
                continue;
            }
            Err(e) => return Err(e),
        }
        summary.spills_passed += 1;
        summary.pot += spill.info.pot();

        for record in &spill.records {
            summary.events_seen += 1;
            match on_event(record) {
                Ok(EventOutcome::Passed) => summary.events_passed += 1,
                Ok(EventOutcome::Rejected) => {}
                Err(e) if e.is_per_event() && policy == FailurePolicy::Skip => {
                    log::debug!("event {} skipped: {e}", summary.events_seen);
                    summary.events_failed += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    if summary.events_failed > 0 || summary.spills_failed > 0 {
        log::warn!(
            "{}: {} event(s) and {} spill(s) dropped on evaluation errors",
            source.describe(),
            summary.events_failed,
            summary.spills_failed
        );
    }
    Ok(summary)
}

/// Map a non-per-event error raised while reading `source` to a message that
/// names the source.
pub(crate) fn name_source_error(source: &str, e: Error) -> Error {
    match e {
        Error::Resource(msg) => Error::Resource(format!("{source}: {msg}")),
        Error::Io(io) => Error::Resource(format!("{source}: {io}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nx_core::{FieldError, MemorySource, Spill};

    fn source() -> MemorySource<f64, i32> {
        MemorySource::new(
            "mem",
            vec![
                Spill::new(1.0, vec![1, 2, 3]),
                Spill::new(-1.0, vec![4]),
                Spill::new(2.0, vec![5]),
            ],
        )
    }

    fn good_spill() -> Cut<f64> {
        Cut::simple("good", |pot: &f64| *pot > 0.0)
    }

    #[test]
    fn bad_spills_are_skipped_entirely() {
        let mut seen = Vec::new();
        let summary = run(&mut source(), &good_spill(), FailurePolicy::Skip, |r| {
            seen.push(*r);
            Ok(EventOutcome::Passed)
        })
        .unwrap();
        assert_eq!(seen, vec![1, 2, 3, 5]);
        assert_eq!(summary.spills_seen, 3);
        assert_eq!(summary.spills_passed, 2);
        assert_eq!(summary.pot, 3.0);
        assert_eq!(summary.events_seen, 4);
        assert_eq!(summary.events_passed, 4);
    }

    #[test]
    fn per_event_failures_skip_or_abort() {
        let failing = |r: &i32| {
            if *r == 2 {
                Err(Error::extraction("x", FieldError::Missing("x")))
            } else if *r % 2 == 1 {
                Ok(EventOutcome::Passed)
            } else {
                Ok(EventOutcome::Rejected)
            }
        };
        let summary = run(&mut source(), &good_spill(), FailurePolicy::Skip, failing).unwrap();
        assert_eq!(summary.events_passed, 3);
        assert_eq!(summary.events_failed, 1);
        assert_eq!(summary.events_rejected(), 0);

        let err = run(&mut source(), &good_spill(), FailurePolicy::Abort, failing).unwrap_err();
        assert!(err.is_per_event());
    }

    #[test]
    fn spill_cut_failures_follow_policy() {
        let broken = Cut::new("broken", |pot: &f64| {
            if *pot > 1.5 { Err(FieldError::Missing("spill")) } else { Ok(true) }
        });
        let summary =
            run(&mut source(), &broken, FailurePolicy::Skip, |_| Ok(EventOutcome::Passed)).unwrap();
        assert_eq!(summary.spills_failed, 1);
        assert_eq!(summary.spills_passed, 2);
        assert!(run(&mut source(), &broken, FailurePolicy::Abort, |_| Ok(EventOutcome::Passed))
            .is_err());
    }

    #[test]
    fn fatal_errors_always_abort() {
        let err = run(&mut source(), &good_spill(), FailurePolicy::Skip, |_| {
            Err(Error::Resource("disk gone".into()))
        })
        .unwrap_err();
        assert!(matches!(err, Error::Resource(_)));
    }

    #[test]
    fn source_errors_are_named() {
        let e = name_source_error("ds", Error::Resource("bad line".into()));
        assert_eq!(e.to_string(), "Resource error: ds: bad line");
    }
}
