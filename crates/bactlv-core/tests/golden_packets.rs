use bactlv_core::constructed::{
    ConstructedData, ConstructedElement, ConstructedValue, ErrorRecord, LogData, LogDataValue,
    LogRecordDatum, ParseArgs, PropertyValue,
};
use bactlv_core::encoding::boxed::BoxOptions;
use bactlv_core::encoding::reader::ReadBuffer;
use bactlv_core::encoding::tag::{TagClass, TagHeader};
use bactlv_core::encoding::writer::Encode;
use bactlv_core::types::{
    ApplicationTag, BitString, ErrorClass, ErrorCode, ObjectId, ObjectType, Payload, PropertyId,
};
use bactlv_core::{DecodeError, ErrorKind};

#[test]
fn tag_header_0x24_matches_fixture() {
    let header = TagHeader::new(TagClass::Application, 2, 4);
    assert_eq!(header.to_bytes().unwrap(), vec![0x24]);
    let mut r = ReadBuffer::new(&[0x24]);
    assert_eq!(TagHeader::decode(&mut r).unwrap(), header);
}

#[test]
fn analog_present_value_with_priority_matches_fixture() {
    let pv = PropertyValue::new(
        PropertyId::PresentValue,
        None,
        ConstructedValue::analog_present_value(72.5),
        Some(8),
    );
    assert_eq!(
        pv.to_bytes().unwrap(),
        vec![0x09, 0x55, 0x2E, 0x44, 0x42, 0x91, 0x00, 0x00, 0x2F, 0x39, 0x08]
    );
}

#[test]
fn object_name_matches_fixture() {
    let pv = PropertyValue::new(
        PropertyId::ObjectName,
        None,
        ConstructedValue::object_name("hello"),
        None,
    );
    assert_eq!(
        pv.to_bytes().unwrap(),
        vec![0x09, 0x4D, 0x2E, 0x75, 0x06, 0x00, 0x68, 0x65, 0x6C, 0x6C, 0x6F, 0x2F]
    );
}

#[test]
fn object_list_matches_fixture() {
    let pv = PropertyValue::new(
        PropertyId::ObjectList,
        None,
        ConstructedValue::object_list(
            None,
            &[
                ObjectId::new(ObjectType::Device, 1),
                ObjectId::new(ObjectType::AnalogInput, 5),
            ],
        ),
        None,
    );
    assert_eq!(
        pv.to_bytes().unwrap(),
        vec![
            0x09, 0x4C, 0x2E, 0xC4, 0x02, 0x00, 0x00, 0x01, 0xC4, 0x00, 0x00, 0x00, 0x05, 0x2F
        ]
    );

    let counted = PropertyValue::new(
        PropertyId::ObjectList,
        Some(0),
        ConstructedValue::object_list(Some(2), &[]),
        None,
    );
    assert_eq!(
        counted.to_bytes().unwrap(),
        vec![0x09, 0x4C, 0x19, 0x00, 0x2E, 0x21, 0x02, 0x2F]
    );
}

#[test]
fn proprietary_property_keeps_raw_elements() {
    let bytes = [
        0x0A, 0x02, 0x00, 0x2E, 0x21, 0x07, 0x0E, 0x11, 0x0F, 0x1A, 0xAB, 0xCD, 0x2F,
    ];
    let pv = PropertyValue::parse(&bytes, ObjectType::Device).unwrap();
    assert_eq!(pv.property_identifier(), PropertyId::Proprietary(512));
    let ConstructedValue::Unspecified(elements) = pv.value() else {
        panic!("expected raw elements, got {:?}", pv.value());
    };
    assert_eq!(elements.len(), 3);
    assert_eq!(
        elements[0],
        ConstructedElement::Application(ApplicationTag::unsigned(7))
    );
    assert_eq!(pv.to_bytes().unwrap(), bytes);
}

#[test]
fn log_data_frames_match_fixtures() {
    assert_eq!(
        LogData::log_status(1, BitString::new(vec![true, false, true]))
            .to_bytes()
            .unwrap(),
        vec![0x1E, 0x0A, 0x05, 0xA0, 0x1F]
    );
    assert_eq!(
        LogData::log_data(1, vec![LogRecordDatum::boolean(true), LogRecordDatum::real(10.0)])
            .to_bytes()
            .unwrap(),
        vec![0x1E, 0x1E, 0x09, 0x01, 0x1C, 0x41, 0x20, 0x00, 0x00, 0x1F, 0x1F]
    );
    assert_eq!(
        LogData::time_change(1, 1.0).to_bytes().unwrap(),
        vec![0x1E, 0x2C, 0x3F, 0x80, 0x00, 0x00, 0x1F]
    );
    assert_eq!(
        LogData::log_data(
            1,
            vec![LogRecordDatum::failure(ErrorRecord::new(
                ErrorClass::Object,
                ErrorCode::UnknownObject
            ))]
        )
        .to_bytes()
        .unwrap(),
        vec![0x1E, 0x1E, 0x7E, 0x91, 0x01, 0x91, 0x1F, 0x7F, 0x1F, 0x1F]
    );
}

#[test]
fn log_status_flags_decode_in_bit_order() {
    let data = LogData::parse(&[0x1E, 0x0A, 0x05, 0xA0, 0x1F], 1).unwrap();
    let LogDataValue::LogStatus(tag) = data.value() else {
        panic!("expected a log status, got {:?}", data.value());
    };
    let Payload::BitString(flags) = tag.payload() else {
        panic!("expected a bit string, got {:?}", tag.payload());
    };
    // log-disabled, buffer-purged, log-interrupted
    assert_eq!(flags.data(), &[true, false, true]);
    assert_eq!(flags.unused_bits(), 5);
}

#[test]
fn unknown_log_data_choice_is_reported_with_offset() {
    let err = LogData::parse(&[0x1E, 0x3C, 0x3F, 0x80, 0x00, 0x00, 0x1F], 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownVariant);
    assert_eq!(err.offset(), 1);
    assert!(matches!(
        err.root(),
        DecodeError::UnknownVariant { value: 3, .. }
    ));
}

#[test]
fn wrong_closing_tag_is_a_framing_violation() {
    let args = ParseArgs::new(2, ObjectType::AnalogValue, PropertyId::PresentValue);
    let err = ConstructedData::parse(&[0x2E, 0x44, 0x42, 0x91, 0x00, 0x00, 0x3F], &args)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::FramingViolation);
    assert_eq!(err.offset(), 6);
}

#[test]
fn truncated_input_reports_the_field_trail() {
    let args = ParseArgs::new(2, ObjectType::AnalogValue, PropertyId::PresentValue);
    let err = ConstructedData::parse(&[0x2E, 0x44, 0x42, 0x91], &args).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Truncated);
    assert_eq!(
        err.breadcrumb(),
        vec!["ConstructedData", "ConstructedValue", "presentValue", "payload"]
    );
}

#[test]
fn boxed_rendering_with_footers() {
    let data = ConstructedData::new(2, ConstructedValue::analog_present_value(72.5));
    let plain = data.render_boxed().unwrap();
    assert!(plain.contains("72.5"));

    let with_footer = data
        .render_boxed_with(BoxOptions {
            pos_length_footer: true,
            ..BoxOptions::default()
        })
        .unwrap();
    assert!(with_footer.contains("0/7"));
}

#[cfg(feature = "serde")]
#[test]
fn decoded_values_serialize_to_json() {
    let pv = PropertyValue::parse(
        &[0x09, 0x55, 0x2E, 0x44, 0x42, 0x91, 0x00, 0x00, 0x2F, 0x39, 0x08],
        ObjectType::AnalogValue,
    )
    .unwrap();
    let json = serde_json::to_string(&pv).unwrap();
    assert!(json.contains("AnalogPresentValue"));
    let back: PropertyValue = serde_json::from_str(&json).unwrap();
    assert_eq!(back, pv);
}
