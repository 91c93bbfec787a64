use super::TimeSeries;
use crate::{FillPolicy, Interpolation, KinetraceError};

impl TimeSeries {
    /// Merge channels, channel metadata and events from `other`.
    ///
    /// - `names`: channels to take from `other`; `None` takes all of them.
    /// - `resample`: when the two time axes differ, linearly re-grid a copy of
    ///   `other` onto this time axis first (samples outside `other`'s range
    ///   become NaN). When false, differing time axes are an error.
    /// - `overwrite`: replace channels that already exist here. When false,
    ///   existing channels and their metadata are kept.
    ///
    /// Every event of `other` is added; events are never collapsed.
    ///
    /// ```
    /// use kinetrace_core::TimeSeries;
    /// let mut a = TimeSeries::new(vec![0.0, 1.0, 2.0]).with_scalar("x", vec![1.0, 2.0, 3.0]).unwrap();
    /// let mut b = TimeSeries::new(vec![0.0, 2.0]).with_scalar("y", vec![0.0, 4.0]).unwrap();
    /// b.add_event(1.0, "push").unwrap();
    /// assert!(a.merge(&b, None, false, false).is_err());
    /// a.merge(&b, None, true, false).unwrap();
    /// assert_eq!(a.data("y").unwrap().as_slice().unwrap(), &[0.0, 2.0, 4.0]);
    /// assert_eq!(a.event_count("push"), 1);
    /// ```
    ///
    /// # Errors
    /// - `NotFound` if a requested channel is missing from `other`.
    /// - `InvalidRange` if the time axes differ and `resample` is false.
    /// - Any error from re-gridding `other`.
    pub fn merge(
        &mut self,
        other: &Self,
        names: Option<&[&str]>,
        resample: bool,
        overwrite: bool,
    ) -> Result<(), KinetraceError> {
        let names: Vec<String> = match names {
            Some(list) => {
                if let Some(missing) = list.iter().find(|n| !other.has_data(n)) {
                    return Err(KinetraceError::not_found(format!(
                        "channel '{missing}' in merged series"
                    )));
                }
                list.iter().map(|s| (*s).to_string()).collect()
            }
            None => other.channel_names().map(str::to_string).collect(),
        };

        let same_time = self.time == other.time;
        let mut source = if same_time {
            other.get_subset(&names)?
        } else if resample {
            let mut copy = other.get_subset(&names)?;
            copy.resample_to(self.time.clone(), Interpolation::Linear, Some(FillPolicy::Nan))?;
            copy
        } else {
            return Err(KinetraceError::invalid_range(format!(
                "time axes differ ({} vs {} samples) and resampling is disabled",
                self.len(),
                other.len()
            )));
        };

        for name in &names {
            if self.has_data(name) && !overwrite {
                continue;
            }
            if let Some(arr) = source.data.remove(name) {
                self.data.insert(name.clone(), arr);
                match source.data_info.remove(name) {
                    Some(info) => {
                        self.data_info.insert(name.clone(), info);
                    }
                    None => {
                        self.data_info.remove(name);
                    }
                }
            }
        }
        self.events.extend(other.events.iter().cloned());
        self.sort_events();
        Ok(())
    }
}
