use chrono::NaiveDateTime;

use crate::medicine::{Medicine, MedicineId};

/// Picks the medicine that should ring at `now`, if any.
///
/// A medicine is due when its course is still running, its trigger time
/// falls in the current minute, and today's dose has not been taken. The
/// poller fires several times per minute, so the same medicine stays due
/// across consecutive ticks; the `ringing_id` guard is what keeps a ringing
/// alert from being raised again. First match in list order wins — with a
/// single alert slot, any further matches stay due and ring on a later tick
/// once the slot frees.
pub fn find_due<'a>(
    medicines: &'a [Medicine],
    ringing_id: Option<MedicineId>,
    now: NaiveDateTime,
) -> Option<&'a Medicine> {
    medicines.iter().find(|med| {
        !med.is_expired(now)
            && med.time.matches(now)
            && !med.taken_today
            && ringing_id != Some(med.id)
    })
}
