/// Trigger Zone Operations
///
/// Membership bookkeeping for proximity sensors. A stay report for a prop the
/// zone missed the entry of counts as an entry.
use super::zone_data::{ZoneData, ZoneId, ZoneTable};
use crate::error::{SimError, SimResult};
use crate::events::{publish_event, EventBusData, SimEvent};
use crate::props::PropId;

pub fn create_zone_table() -> ZoneTable {
    ZoneTable { zones: Vec::new() }
}

pub fn add_zone(table: &mut ZoneTable, label: &str) -> ZoneId {
    let id = ZoneId(table.zones.len() as u32);
    table.zones.push(ZoneData {
        id,
        label: label.to_string(),
        members: Vec::new(),
    });
    id
}

pub fn get_zone(table: &ZoneTable, id: ZoneId) -> Option<&ZoneData> {
    table.zones.get(id.0 as usize)
}

fn zone_mut(table: &mut ZoneTable, id: ZoneId) -> SimResult<&mut ZoneData> {
    table
        .zones
        .get_mut(id.0 as usize)
        .ok_or(SimError::UnknownZone { id: id.0 })
}

/// Prop entered (or was seen inside) a zone. Returns true if it is new to the zone.
pub fn enter_zone(
    table: &mut ZoneTable,
    zone: ZoneId,
    prop: PropId,
    events: &mut EventBusData,
) -> SimResult<bool> {
    let data = zone_mut(table, zone)?;
    if data.members.contains(&prop) {
        return Ok(false);
    }
    data.members.push(prop);
    log::debug!("[Zone::enter] prop {} entered {}", prop.0, data.label);
    publish_event(events, SimEvent::ZoneEntered { zone, prop });
    Ok(true)
}

/// Prop left a zone. Returns true if it had been inside.
pub fn exit_zone(
    table: &mut ZoneTable,
    zone: ZoneId,
    prop: PropId,
    events: &mut EventBusData,
) -> SimResult<bool> {
    let data = zone_mut(table, zone)?;
    let before = data.members.len();
    data.members.retain(|member| *member != prop);
    if data.members.len() == before {
        return Ok(false);
    }
    log::debug!("[Zone::exit] prop {} left {}", prop.0, data.label);
    publish_event(events, SimEvent::ZoneExited { zone, prop });
    Ok(true)
}

pub fn is_in_zone(table: &ZoneTable, zone: ZoneId, prop: PropId) -> bool {
    get_zone(table, zone)
        .map(|data| data.members.contains(&prop))
        .unwrap_or(false)
}

pub fn zone_members(table: &ZoneTable, zone: ZoneId) -> &[PropId] {
    get_zone(table, zone)
        .map(|data| data.members.as_slice())
        .unwrap_or(&[])
}

pub fn clear_zones(table: &mut ZoneTable) {
    for zone in table.zones.iter_mut() {
        zone.members.clear();
    }
}
