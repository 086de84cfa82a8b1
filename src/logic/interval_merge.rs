use crate::models::{HourlyClassification, SprayWindow, WindowType, LAST_HOUR};

/// Collapse hourly classifications into recommended/possible windows.
///
/// A window only grows across consecutive hours of the same type. A
/// not-recommended hour, a type change, or a missing hour in the sequence
/// each close the open window. When an hour appears more than once the
/// first entry in input order is used.
pub fn merge(classifications: &[HourlyClassification]) -> Vec<SprayWindow> {
    let mut sorted: Vec<&HourlyClassification> = classifications
        .iter()
        .filter(|c| {
            let in_day = c.hour <= LAST_HOUR;
            if !in_day {
                tracing::debug!("Hour {} is outside the day, classification skipped", c.hour);
            }
            in_day
        })
        .collect();
    // stable: equal hours keep input order
    sorted.sort_by_key(|c| c.hour);
    sorted.dedup_by_key(|c| c.hour);

    let mut windows = Vec::new();
    let mut active: Option<(u32, WindowType)> = None;
    let mut prev_hour: Option<u32> = None;

    for entry in sorted {
        match entry.result.window_type() {
            None => {
                if let (Some((start, window_type)), Some(end)) = (active.take(), prev_hour) {
                    windows.push(SprayWindow {
                        start,
                        end,
                        window_type,
                    });
                }
            }
            Some(current) => match active {
                None => active = Some((entry.hour, current)),
                Some((start, window_type)) => {
                    let consecutive = prev_hour.is_some_and(|p| entry.hour == p + 1);
                    if window_type != current || !consecutive {
                        if let Some(end) = prev_hour {
                            windows.push(SprayWindow {
                                start,
                                end,
                                window_type,
                            });
                        }
                        active = Some((entry.hour, current));
                    }
                }
            },
        }
        prev_hour = Some(entry.hour);
    }

    if let (Some((start, window_type)), Some(end)) = (active, prev_hour) {
        windows.push(SprayWindow {
            start,
            end,
            window_type,
        });
    }

    windows
}
