// 役割分類サービス
//
// ファクト型内の一意性制約を調べ、各役割のカーディナリティ（役割の種別）を判定します。

use crate::core::conceptual::{RoleId, Vocabulary};
use crate::core::relational::RoleType;

/// 役割分類サービス
#[derive(Debug, Clone, Copy)]
pub struct RoleClassifier<'a> {
    vocabulary: &'a Vocabulary,
}

impl<'a> RoleClassifier<'a> {
    /// 新しいRoleClassifierを作成
    pub fn new(vocabulary: &'a Vocabulary) -> Self {
        Self { vocabulary }
    }

    /// 役割の種別を判定
    ///
    /// 役割だけを覆う一意性制約があれば「この側が一意」、
    /// 他のすべての役割を覆う一意性制約があれば「相手側が一意」とみなします。
    /// 客体化されたファクト型では相手側は常に一意です。
    pub fn role_type(&self, role: RoleId) -> RoleType {
        let r = self.vocabulary.role(role);
        let fact_type = self.vocabulary.fact_type(r.fact_type);

        if fact_type.is_subtyping() {
            return if r.ordinal == 1 {
                RoleType::Supertype
            } else {
                RoleType::Subtype
            };
        }

        if fact_type.arity() == 1 {
            return RoleType::Unary;
        }

        let mut others: Vec<RoleId> = fact_type
            .roles
            .iter()
            .copied()
            .filter(|other| *other != role)
            .collect();
        others.sort();

        let mut unique_here = false;
        let mut unique_there = fact_type.objectified_as.is_some();
        for constraint in self.vocabulary.uniqueness_constraints_of(r.fact_type) {
            let mut roles = self
                .vocabulary
                .sequence_roles(self.vocabulary.constraint(constraint).role_sequence);
            roles.sort();
            roles.dedup();
            if roles == [role] {
                unique_here = true;
            }
            if roles == others {
                unique_there = true;
            }
        }

        match (unique_here, unique_there) {
            (true, true) => RoleType::OneOne,
            (true, false) => RoleType::ManyOne,
            (false, true) => RoleType::OneMany,
            (false, false) => RoleType::ManyMany,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::conceptual::VocabularyBuilder;

    #[test]
    fn test_many_one_and_one_many() {
        let mut b = VocabularyBuilder::new("V");
        let order = b.entity_type("Order");
        let customer = b.entity_type("Customer");
        let (_, order_role, customer_role) =
            b.many_to_one(order, customer, "{0} was placed by {1}", true);
        let vocabulary = b.build();
        let classifier = RoleClassifier::new(&vocabulary);

        assert_eq!(classifier.role_type(order_role), RoleType::ManyOne);
        assert_eq!(classifier.role_type(customer_role), RoleType::OneMany);
    }

    #[test]
    fn test_one_one() {
        let mut b = VocabularyBuilder::new("V");
        let person = b.entity_type("Person");
        let address = b.entity_type("Address");
        let (_, rp, ra) = b.one_to_one(person, address, "{0} lives at {1}", true, false);
        let vocabulary = b.build();
        let classifier = RoleClassifier::new(&vocabulary);

        assert_eq!(classifier.role_type(rp), RoleType::OneOne);
        assert_eq!(classifier.role_type(ra), RoleType::OneOne);
    }

    #[test]
    fn test_many_many_without_constraints() {
        let mut b = VocabularyBuilder::new("V");
        let a = b.entity_type("A");
        let c = b.entity_type("C");
        let d = b.entity_type("D");
        let fact_type = b.fact_type(&[a, c, d], "{0} meets {1} at {2}");
        let vocabulary = b.build();
        let classifier = RoleClassifier::new(&vocabulary);

        for role in &vocabulary.fact_type(fact_type).roles {
            assert_eq!(classifier.role_type(*role), RoleType::ManyMany);
        }
    }

    #[test]
    fn test_spanning_uniqueness_over_other_roles() {
        let mut b = VocabularyBuilder::new("V");
        let a = b.entity_type("A");
        let c = b.entity_type("C");
        let d = b.entity_type("D");
        let fact_type = b.fact_type(&[a, c, d], "{0} assigns {1} to {2}");
        let ra = b.role(fact_type, 0);
        let rc = b.role(fact_type, 1);
        let rd = b.role(fact_type, 2);
        b.uniqueness(&[ra, rc]);
        let vocabulary = b.build();
        let classifier = RoleClassifier::new(&vocabulary);

        assert_eq!(classifier.role_type(rd), RoleType::OneMany);
        assert_eq!(classifier.role_type(ra), RoleType::ManyMany);
    }

    #[test]
    fn test_unary_and_subtyping() {
        let mut b = VocabularyBuilder::new("V");
        let person = b.entity_type("Person");
        let employee = b.entity_type("Employee");
        let (_, smokes) = b.unary(person, "{0} smokes");
        let subtyping = b.subtype(employee, person);
        let sub_role = b.role(subtyping, 0);
        let super_role = b.role(subtyping, 1);
        let vocabulary = b.build();
        let classifier = RoleClassifier::new(&vocabulary);

        assert_eq!(classifier.role_type(smokes), RoleType::Unary);
        assert_eq!(classifier.role_type(sub_role), RoleType::Subtype);
        assert_eq!(classifier.role_type(super_role), RoleType::Supertype);
    }

    #[test]
    fn test_objectified_roles_are_unique_there() {
        let mut b = VocabularyBuilder::new("V");
        let person = b.entity_type("Person");
        let sport = b.entity_type("Sport");
        let playing = b.entity_type("Playing");
        let (fact_type, rp, rs) = b.binary(person, sport, "{0} plays {1}");
        b.uniqueness(&[rp, rs]);
        b.objectify(playing, fact_type);
        let vocabulary = b.build();
        let classifier = RoleClassifier::new(&vocabulary);

        assert_eq!(classifier.role_type(rp), RoleType::OneMany);
        assert_eq!(classifier.role_type(rs), RoleType::OneMany);
    }
}
