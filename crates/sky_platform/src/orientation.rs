//! Device-orientation (tilt) sensor seam.
//!
//! Some platforms gate orientation events behind a runtime permission prompt,
//! and desktops have no sensor at all. The game asks once, and any answer other
//! than `Granted` leaves keyboard and touch control in charge.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiltPermission {
    Granted,
    Denied,
    Unavailable,
}

impl TiltPermission {
    pub fn label(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::Denied => "denied",
            Self::Unavailable => "unavailable",
        }
    }
}

pub trait TiltSensor {
    fn request_permission(&mut self) -> TiltPermission;

    /// Latest left/right tilt (gamma) in degrees, if a new reading arrived.
    fn read_gamma(&mut self) -> Option<f32>;
}

/// Sensor for hosts without orientation hardware.
#[derive(Debug, Default)]
pub struct NoTiltSensor;

impl TiltSensor for NoTiltSensor {
    fn request_permission(&mut self) -> TiltPermission {
        TiltPermission::Unavailable
    }

    fn read_gamma(&mut self) -> Option<f32> {
        None
    }
}

/// Ask for permission and log the outcome. Returns true when tilt may be used.
pub fn request_tilt(sensor: &mut dyn TiltSensor) -> bool {
    match sensor.request_permission() {
        TiltPermission::Granted => {
            log::info!("Tilt control enabled");
            true
        }
        other => {
            log::warn!(
                "Tilt permission {}, keeping keyboard/touch control",
                other.label()
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ScriptedSensor {
        answer: TiltPermission,
        readings: Vec<f32>,
    }

    impl TiltSensor for ScriptedSensor {
        fn request_permission(&mut self) -> TiltPermission {
            self.answer
        }

        fn read_gamma(&mut self) -> Option<f32> {
            self.readings.pop()
        }
    }

    #[test]
    fn no_sensor_is_unavailable() {
        let mut sensor = NoTiltSensor;
        assert!(!request_tilt(&mut sensor));
        assert_eq!(sensor.read_gamma(), None);
    }

    #[test]
    fn granted_permission_enables_tilt() {
        let mut sensor = ScriptedSensor {
            answer: TiltPermission::Granted,
            readings: vec![12.0],
        };
        assert!(request_tilt(&mut sensor));
        assert_eq!(sensor.read_gamma(), Some(12.0));
    }

    #[test]
    fn denied_permission_falls_back() {
        let mut sensor = ScriptedSensor {
            answer: TiltPermission::Denied,
            readings: Vec::new(),
        };
        assert!(!request_tilt(&mut sensor));
    }
}
