use proptest::prelude::*;
use semwiki_types::{EntityDescriptor, PropertyOrError, NS_PROPERTY};

proptest! {
    #[test]
    fn encoding_survives_decoding(
        title in "[A-Za-z0-9_ ]{1,24}",
        namespace in -2i32..3000,
        interwiki in "[a-z:]{0,8}",
        subobject in "[A-Za-z0-9_#.]{0,16}",
    ) {
        let entity = EntityDescriptor::new(title, namespace, interwiki, subobject);
        let decoded = EntityDescriptor::decode(&entity.encode()).unwrap();
        prop_assert_eq!(decoded, entity);
    }
}

#[test]
fn display_matches_encoding() {
    let entity = EntityDescriptor::page("Foo", 0);
    assert_eq!(entity.to_string(), "Foo#0##");
    assert_eq!("Foo#0##".parse::<EntityDescriptor>().unwrap(), entity);
}

#[test]
fn property_titles_from_the_id_table() {
    let titles = ["Has_author", "_TYPE", "Broken[title]"];
    let entries: Vec<PropertyOrError> = titles.iter().map(|t| PropertyOrError::from_title(t)).collect();

    assert_eq!(entries[0].property().unwrap().declaration_page().namespace, NS_PROPERTY);
    assert!(entries[1].property().unwrap().is_predefined());
    assert!(entries[2].is_error());
}
