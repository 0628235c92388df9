#[macro_export]
macro_rules! test_with_state {
    ($name:ident, |$state:ident, $gateway:ident| $body:block) => {
        #[tokio::test(flavor = "multi_thread")]
        async fn $name() {
            #[allow(unused_variables)]
            let ($state, $gateway) = $crate::helpers::create_test_state().await;
            $body
        }
    };
}
