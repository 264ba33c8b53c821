// 統合テスト共通のフィクスチャ語彙
#![allow(dead_code)]

use factmap::core::conceptual::{Assimilation, Subtyping, Vocabulary, VocabularyBuilder};
use factmap::core::config::MappingConfig;
use factmap::core::relational::RelationalModel;
use factmap::services::composition::RelationalComposer;

/// 既定設定で語彙を変換する
pub fn compose(vocabulary: &Vocabulary) -> RelationalModel {
    RelationalComposer::new(MappingConfig::default())
        .unwrap()
        .compose(vocabulary)
        .unwrap()
}

/// Person と Address が必須の一対一 "lives at" で結ばれた語彙
pub fn person_address() -> Vocabulary {
    let mut b = VocabularyBuilder::new("PersonAddress");
    let name = b.value_type("Name");
    let street = b.value_type("Street");
    let city = b.value_type("City");
    let person = b.entity_type("Person");
    let address = b.entity_type("Address");
    b.identified_by(person, name);
    b.identified_by(address, street);
    b.many_to_one(address, city, "{0} is in {1}", true);
    b.one_to_one(person, address, "{0} lives at {1}", true, false);
    b.build()
}

/// 自動採番の識別子を持つ Employee を3つのテーブルが参照する語彙
pub fn employee_auto_counter() -> Vocabulary {
    let mut b = VocabularyBuilder::new("Staff");
    let auto = b.value_type("AutoCounter");
    let id = b.value_type("EmployeeId");
    b.value_supertype(id, auto);
    let employee = b.entity_type("Employee");
    b.identified_by(employee, id);
    for holder in ["Payroll", "Timesheet", "Badge"] {
        let h = b.entity_type(holder);
        let nr = b.value_type(&format!("{}Nr", holder));
        b.identified_by(h, nr);
        b.many_to_one(h, employee, "{0} is for {1}", true);
    }
    b.build()
}

/// 自己参照 "Employee is managed by Employee" を持つ語彙
pub fn self_managed_employee() -> Vocabulary {
    let mut b = VocabularyBuilder::new("Hierarchy");
    let nr = b.value_type("EmployeeNr");
    let name = b.value_type("Name");
    let employee = b.entity_type("Employee");
    b.identified_by(employee, nr);
    b.many_to_one(employee, name, "{0} has {1}", true);
    let (_, _, manager) = b.many_to_one(employee, employee, "{0} is managed by {1}", false);
    b.role_name(manager, "Manager");
    b.build()
}

/// 一対一 "Permit is for Vehicle" の Vehicle 側の役割で識別される Permit を Inspection が参照する語彙
pub fn permit_vehicle() -> Vocabulary {
    let mut b = VocabularyBuilder::new("Permits");
    let vin = b.value_type("VIN");
    let inspection_nr = b.value_type("InspectionNr");
    let zone = b.value_type("Zone");
    let vehicle = b.entity_type("Vehicle");
    let permit = b.entity_type("Permit");
    let inspection = b.entity_type("Inspection");
    b.identified_by(vehicle, vin);
    b.identified_by(inspection, inspection_nr);
    let (_, permit_role, vehicle_role) = b.binary(permit, vehicle, "{0} is for {1}");
    b.uniqueness(&[permit_role]);
    b.mandatory(permit_role);
    b.identify(permit, &[vehicle_role]);
    b.many_to_one(permit, zone, "{0} covers {1}", false);
    b.many_to_one(inspection, permit, "{0} checks {1}", true);
    b.build()
}

/// 3つの役割すべてにまたがる一意性だけを持つ三項ファクト型の語彙
pub fn ternary_speaks() -> Vocabulary {
    let mut b = VocabularyBuilder::new("Languages");
    let name = b.value_type("Name");
    let code = b.value_type("LanguageCode");
    let country_code = b.value_type("CountryCode");
    let person = b.entity_type("Person");
    let language = b.entity_type("Language");
    let country = b.entity_type("Country");
    b.identified_by(person, name);
    b.identified_by(language, code);
    b.identified_by(country, country_code);
    let speaks = b.fact_type(&[person, language, country], "{0} speaks {1} in {2}");
    let roles = [b.role(speaks, 0), b.role(speaks, 1), b.role(speaks, 2)];
    b.uniqueness(&roles);
    b.build()
}

/// 多くの規則を同時に使う語彙（サブタイプ、単項、複合識別子、値制約、客体化）
pub fn company() -> Vocabulary {
    let mut b = VocabularyBuilder::new("Company");
    let person_nr = b.value_type("PersonNr");
    let name = b.value_type("Name");
    b.value_facets(name, Some(64), None);
    let gender = b.value_type("Gender");
    b.value_restriction(gender, &["M", "F"]);
    let building = b.value_type("Building");
    let room_number = b.value_type("RoomNumber");
    let date = b.value_type("Date");

    let person = b.entity_type("Person");
    let employee = b.entity_type("Employee");
    let contractor = b.entity_type("Contractor");
    let room = b.entity_type("Room");
    let assignment = b.entity_type("Assignment");

    b.identified_by(person, person_nr);
    b.many_to_one(person, name, "{0} has {1}", true);
    b.many_to_one(person, gender, "{0} is of {1}", false);
    b.unary(person, "{0} smokes");

    b.subtype(employee, person);
    b.subtype_with(
        contractor,
        person,
        Subtyping {
            provides_identification: true,
            assimilation: Assimilation::Separate,
        },
    );

    let (_, _, building_role) = b.many_to_one(room, building, "{0} is in {1}", true);
    let (_, _, number_role) = b.many_to_one(room, room_number, "{0} has {1}", true);
    b.identify(room, &[number_role, building_role]);

    b.many_to_one(employee, room, "{0} works in {1}", false);

    let (assigned, contractor_role, room_role) =
        b.binary(contractor, room, "{0} is assigned to {1}");
    b.identify(assignment, &[contractor_role, room_role]);
    b.objectify(assignment, assigned);
    b.many_to_one(assignment, date, "{0} started on {1}", true);

    b.build()
}
