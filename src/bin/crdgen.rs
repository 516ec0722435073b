//! Print the ApiPlatform CRD manifest as YAML.

use kube::CustomResourceExt;

use apiplatform_operator::crd::api_platform::ApiPlatform;

fn main() {
    let crd = ApiPlatform::crd();
    print!("{}", serde_yaml::to_string(&crd).expect("CRD serializes"));
}
