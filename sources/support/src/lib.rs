pub mod descriptor;
pub mod intern;
pub mod types;

#[cfg(test)]
mod tests {
    use crate::descriptor::{BaseType, FieldType, MethodType};
    use crate::types::MethodDescriptor;
    use anyhow::Result;

    #[test]
    fn it_parses_simple_descriptors() -> Result<()> {
        let descriptor = FieldType::parse("Z")?;
        let descriptor = descriptor.into_base().unwrap();

        assert!(descriptor.is_boolean());

        Ok(())
    }

    #[test]
    fn it_parses_array_descriptors() -> Result<()> {
        let descriptor = FieldType::parse("[D")?;
        let component = descriptor.into_array().unwrap();
        let component = component.into_base().unwrap();

        assert!(component.is_double());

        Ok(())
    }

    #[test]
    fn it_parses_class_descriptors() -> Result<()> {
        let descriptor = FieldType::parse("Ljava/lang/Object;")?;
        assert_eq!(descriptor.class_name(), Some("java/lang/Object"));

        Ok(())
    }

    #[test]
    fn it_parses_method_descriptors() -> Result<()> {
        let descriptor = MethodType::parse("(IDLjava/lang/Thread;)Ljava/lang/Object;")?;
        assert_eq!(
            descriptor.parameters,
            vec![
                FieldType::Base(BaseType::Int),
                FieldType::Base(BaseType::Double),
                FieldType::object("java/lang/Thread"),
            ]
        );

        assert_eq!(descriptor.return_type, FieldType::object("java/lang/Object"));

        Ok(())
    }

    #[test]
    fn it_unparses_descriptors() -> Result<()> {
        for descriptor in ["Z", "[D", "[[Ljava/util/List;"] {
            assert_eq!(FieldType::parse(descriptor)?.to_string(), descriptor);
        }

        for descriptor in [
            "(IDLjava/lang/Thread;)Ljava/lang/Object;",
            "(Ljava/lang/Object;ILjava/lang/Object;II)V",
            "()V",
        ] {
            assert_eq!(MethodType::parse(descriptor)?.to_string(), descriptor);
        }

        Ok(())
    }

    #[test]
    fn it_rejects_truncated_method_descriptors() {
        assert!(MethodType::parse("(I").is_err());
        assert!(MethodType::parse("I)V").is_err());
    }

    #[test]
    fn signature_surgery_round_trips() -> Result<()> {
        let signature: MethodDescriptor = ("f", "(I)I").try_into()?;
        let receiver = FieldType::object("x/I");

        let moved = signature
            .with_name_suffix("$default")
            .prepend_parameter(receiver.clone());

        assert_eq!(moved.name(), "f$default");
        assert_eq!(moved.descriptor().to_string(), "(Lx/I;I)I");

        let back = moved
            .strip_name_suffix("$default")
            .and_then(|s| s.drop_leading_parameter(&receiver));
        assert_eq!(back, Some(signature));

        Ok(())
    }

    #[test]
    fn parameter_slots_count_wide_types() -> Result<()> {
        let ty = MethodType::parse("(JDI)V")?;
        assert_eq!(ty.parameter_slots(), 5);

        Ok(())
    }
}
