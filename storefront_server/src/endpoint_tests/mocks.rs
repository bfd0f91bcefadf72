use mockall::mock;
use paypal_tools::{IpnVerdict, IpnVerification, PayPalApiError};

mock! {
    pub IpnVerifier {}
    impl IpnVerification for IpnVerifier {
        async fn verify(&self, raw_body: &[u8]) -> Result<IpnVerdict, PayPalApiError>;
    }
}
