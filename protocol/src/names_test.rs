use super::*;

#[test]
fn request_table_is_indexed_by_declaration_order() {
    for (idx, spec) in REQUESTS.iter().enumerate() {
        assert_eq!(spec.name as usize, idx, "{:?} is out of place", spec.name);
    }
}

#[test]
fn event_table_is_indexed_by_declaration_order() {
    for (idx, spec) in EVENTS.iter().enumerate() {
        assert_eq!(spec.name as usize, idx, "{:?} is out of place", spec.name);
    }
}

#[test]
fn pad_requests_are_renamed_in_current_version() {
    assert_eq!(RequestName::GetPad.wire_name(ProtocolVersion::V2), "getPad");
    assert_eq!(RequestName::GetPad.wire_name(ProtocolVersion::V3), "getMap");
    assert_eq!(RequestName::SetPadId.wire_name(ProtocolVersion::V3), "setMapId");
    assert_eq!(RequestName::AddMarker.wire_name(ProtocolVersion::V3), "addMarker");
}

#[test]
fn request_lookup_is_version_specific() {
    assert_eq!(RequestName::from_wire(ProtocolVersion::V2, "findPads"), Some(RequestName::FindPads));
    assert_eq!(RequestName::from_wire(ProtocolVersion::V3, "findMaps"), Some(RequestName::FindPads));
    assert_eq!(RequestName::from_wire(ProtocolVersion::V3, "findPads"), None);
    assert_eq!(RequestName::from_wire(ProtocolVersion::V2, "nope"), None);
}

#[test]
fn pad_events_are_renamed_in_current_version() {
    assert_eq!(PushEvent::from_wire(ProtocolVersion::V2, "padData"), Some(PushEvent::PadData));
    assert_eq!(PushEvent::from_wire(ProtocolVersion::V3, "mapData"), Some(PushEvent::PadData));
    assert_eq!(PushEvent::from_wire(ProtocolVersion::V3, "padData"), None);
    assert_eq!(PushEvent::DeletePad.canonical_name(), "deleteMap");
    assert_eq!(PushEvent::from_canonical("linePoints"), Some(PushEvent::LinePoints));
}

#[test]
fn only_marker_and_line_events_carry_data_bags() {
    let with_bag: Vec<_> = EVENTS.iter().filter(|spec| spec.data_bag).map(|spec| spec.name).collect();
    assert_eq!(with_bag, vec![PushEvent::Marker, PushEvent::Line]);
}

#[test]
fn lines_are_applied_before_their_points() {
    assert!((PushEvent::Line as usize) < (PushEvent::LinePoints as usize));
    assert!((PushEvent::PadData as usize) < (PushEvent::Marker as usize));
}

#[test]
fn display_uses_client_facing_names() {
    assert_eq!(RequestName::SetPadId.to_string(), "setPadId");
    assert_eq!(PushEvent::PadData.to_string(), "padData");
}
